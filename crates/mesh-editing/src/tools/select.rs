//! Click and box selection.

use glam::Vec2;
use tracing::{debug, warn};

use crate::constants::BOX_SELECT_MIN_DRAG;
use crate::history::CaptureKind;
use crate::selection::ScreenRect;
use crate::session::EditingSession;

use super::{EditTool, OverlayPrimitive, PointerEvent, ToolContext, ToolKind};

/// Press-drag-release state of one gesture
#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    start: Vec2,
    current: Vec2,
    additive: bool,
    /// Pointer travelled far enough to become a box select
    boxing: bool,
}

/// Picks the entity under the cursor on release, or everything inside the
/// dragged rectangle once the pointer has travelled `BOX_SELECT_MIN_DRAG`
///
/// Each gesture records one selection change together with the pivot it
/// moved.
#[derive(Debug, Default)]
pub struct SelectTool {
    press: Option<Press>,
}

impl SelectTool {
    fn click(ctx: &mut ToolContext<'_>, cursor: Vec2, additive: bool) {
        let operations = ctx.operations;
        let projector = ctx.projector;
        let Some(document) = ctx.session.active_document() else {
            return;
        };
        let mode = ctx.session.selection().mode();
        let hit = operations.hit_test(cursor, document, mode, projector);
        debug!("select: click at {:?} hit {:?}", cursor, hit.map(|h| h.entity));

        let tracked = ctx.history.track(
            ctx.session,
            CaptureKind::SelectionWithView,
            "Select",
            |session: &mut EditingSession| {
                operations.apply_hit_result(
                    session.selection_mut(),
                    hit.map(|h| h.entity),
                    additive,
                );
                session.recompute_pivot();
            },
        );
        if let Err(err) = tracked {
            warn!("select: {}", err);
        }
    }

    fn box_select(ctx: &mut ToolContext<'_>, rect: ScreenRect, additive: bool) {
        let operations = ctx.operations;
        let projector = ctx.projector;
        let tracked = ctx.history.track(
            ctx.session,
            CaptureKind::SelectionWithView,
            "Box Select",
            |session: &mut EditingSession| {
                if let Some((document, selection)) = session.document_and_selection_mut() {
                    operations.select_in_rect(selection, rect, document, projector, additive);
                }
                session.recompute_pivot();
            },
        );
        if let Err(err) = tracked {
            warn!("select: {}", err);
        }
    }
}

impl EditTool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.press = None;
    }

    fn pointer_down(&mut self, _ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        self.press = Some(Press {
            start: event.screen,
            current: event.screen,
            additive: event.additive,
            boxing: false,
        });
    }

    fn pointer_drag(&mut self, _ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        if let Some(press) = self.press.as_mut() {
            press.current = event.screen;
            if press.start.distance(press.current) >= BOX_SELECT_MIN_DRAG {
                press.boxing = true;
            }
        }
    }

    fn pointer_up(&mut self, ctx: &mut ToolContext<'_>, event: &PointerEvent) {
        let Some(press) = self.press.take() else {
            return;
        };
        if press.boxing {
            let rect = ScreenRect::from_corners(press.start, event.screen);
            Self::box_select(ctx, rect, press.additive);
        } else {
            Self::click(ctx, event.screen, press.additive);
        }
    }

    fn overlay(&self, session: &EditingSession) -> Vec<OverlayPrimitive> {
        let mut overlay = Vec::new();
        if let Some(press) = self.press.filter(|p| p.boxing) {
            overlay.push(OverlayPrimitive::SelectionRect(ScreenRect::from_corners(
                press.start,
                press.current,
            )));
        }
        if !session.selection().is_empty() {
            overlay.push(OverlayPrimitive::Pivot(session.view().pivot));
        }
        overlay
    }
}
