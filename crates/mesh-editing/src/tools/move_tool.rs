//! Drag selected vertices on the host's working plane.

use glam::Vec3;
use tracing::{debug, warn};

use crate::document::VertexId;
use crate::history::CaptureKind;
use crate::session::EditingSession;

use super::{EditTool, OverlayPrimitive, PointerEvent, ToolContext, ToolKind};

#[derive(Debug, Clone)]
struct Grab {
    /// World point under the cursor when the drag started
    anchor: Vec3,
    /// Positions before the drag
    originals: Vec<(VertexId, Vec3)>,
}

/// Moves every vertex touched by the selection
///
/// Positions are always `original + (cursor - anchor)`, so the result does
/// not depend on how many drag events arrive. The whole gesture, including
/// the recomputed pivot, becomes one history record.
#[derive(Debug, Default)]
pub struct MoveTool {
    grab: Option<Grab>,
}

impl MoveTool {
    const LABEL: &'static str = "Move Vertices";

    fn finish(&mut self, ctx: &mut ToolContext<'_>) {
        if self.grab.take().is_none() {
            return;
        }
        // The pivot belongs to the record so undo puts it back with the vertices
        ctx.session.recompute_pivot();
        ctx.history.end_drag(ctx.session, CaptureKind::VertexMoveWithView, Self::LABEL);
    }
}

impl EditTool for MoveTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Move
    }

    fn deactivate(&mut self, ctx: &mut ToolContext<'_>) {
        self.finish(ctx);
    }

    fn pointer_down(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let Some(anchor) = event.world else {
            return;
        };
        let Some(document) = ctx.session.active_document() else {
            return;
        };
        let originals: Vec<(VertexId, Vec3)> = ctx
            .session
            .selection()
            .affected_vertices(document)
            .into_iter()
            .filter_map(|v| document.position(v).map(|p| (v, p)))
            .collect();
        if originals.is_empty() {
            return;
        }

        match ctx.history.begin_drag(ctx.session, CaptureKind::VertexMoveWithView) {
            Ok(true) => {
                debug!("move: grabbed {} vertices", originals.len());
                self.grab = Some(Grab { anchor, originals });
            }
            Ok(false) => {}
            Err(err) => warn!("move: {}", err),
        }
    }

    fn pointer_drag(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let (Some(grab), Some(world)) = (self.grab.as_ref(), event.world) else {
            return;
        };
        let offset = world - grab.anchor;
        let Some(document) = ctx.session.active_document_mut() else {
            return;
        };
        for &(id, original) in &grab.originals {
            document.set_vertex_position(id, original + offset);
        }
    }

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        self.pointer_drag(ctx, event);
        self.finish(ctx);
    }

    fn overlay(&self, session: &EditingSession) -> Vec<OverlayPrimitive> {
        if session.selection().is_empty() {
            Vec::new()
        } else {
            vec![OverlayPrimitive::Pivot(session.view().pivot)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_fixtures::quad;
    use crate::history::{HistoryFacet, Record, UndoController};
    use crate::selection::{EntityRef, SelectionOperations};
    use crate::tools::test_support::top_view;
    use glam::Vec2;

    fn event(world: Vec3) -> PointerEvent {
        PointerEvent::at(Vec2::ZERO).with_world(world)
    }

    #[test]
    fn test_drag_records_one_sparse_move() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        session.selection_mut().add(EntityRef::Vertex(VertexId(2)));
        let mut history = UndoController::default();
        let operations = SelectionOperations::default();
        let mut ctx = ToolContext {
            session: &mut session,
            history: &mut history,
            operations: &operations,
            projector: &top_view,
        };

        let mut tool = MoveTool::default();
        ctx.session.recompute_pivot();
        assert_eq!(ctx.session.view().pivot, Vec3::new(1.0, 1.0, 0.0));

        tool.pointer_down(&mut ctx, &event(Vec3::ZERO));
        for step in 1..=10 {
            tool.pointer_drag(&mut ctx, &event(Vec3::new(0.1 * step as f32, 0.0, 0.0)));
        }
        tool.pointer_up(&mut ctx, &event(Vec3::new(1.0, 0.0, 0.0)));

        let document = ctx.session.active_document().unwrap();
        assert_eq!(document.position(VertexId(2)), Some(Vec3::new(2.0, 1.0, 0.0)));
        assert_eq!(document.position(VertexId(0)), Some(Vec3::ZERO));
        assert_eq!(ctx.session.view().pivot, Vec3::new(2.0, 1.0, 0.0));

        let stack = ctx.history.stack(HistoryFacet::Document);
        assert_eq!(stack.len(), 1);
        let Some(Record::VertexMove(record)) = stack.peek_undo() else {
            panic!("expected a vertex move record");
        };
        assert_eq!(record.ids, vec![VertexId(2)]);

        assert!(ctx.history.undo(ctx.session));
        assert_eq!(
            ctx.session.active_document().unwrap().position(VertexId(2)),
            Some(Vec3::new(1.0, 1.0, 0.0))
        );
        assert_eq!(ctx.session.view().pivot, Vec3::new(1.0, 1.0, 0.0));

        assert!(ctx.history.redo(ctx.session));
        assert_eq!(ctx.session.view().pivot, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_nothing_selected_does_not_drag() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        let mut history = UndoController::default();
        let operations = SelectionOperations::default();
        let mut ctx = ToolContext {
            session: &mut session,
            history: &mut history,
            operations: &operations,
            projector: &top_view,
        };

        let mut tool = MoveTool::default();
        tool.pointer_down(&mut ctx, &event(Vec3::ZERO));
        assert!(!ctx.history.is_any_drag_pending());
        tool.pointer_up(&mut ctx, &event(Vec3::ONE));
        assert!(ctx.history.stack(HistoryFacet::Document).is_empty());
        assert_eq!(ctx.session.active_document().unwrap(), &quad());
    }
}
