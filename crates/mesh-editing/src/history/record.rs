//! History records: one undoable action each.
//!
//! Undo applies the Before side, redo the After side. Applying either side
//! twice leaves the same state as applying it once.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::VertexId;
use crate::error::ConsistencyError;
use crate::session::{DocumentId, EditingSession};
use crate::snapshot::{DocumentSnapshot, MeshSnapshot, SelectionSnapshot, ViewSnapshot};

use super::HistoryDirection;

/// Behaviour shared by every record type
pub trait Undoable {
    /// Human-readable name for menus ("Undo Merge Vertices")
    fn label(&self) -> &str;

    /// Restore the Before side
    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError>;

    /// Restore the After side
    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError>;

    fn apply(
        &self,
        direction: HistoryDirection,
        session: &mut EditingSession,
    ) -> Result<(), ConsistencyError> {
        match direction {
            HistoryDirection::Undo => self.undo(session),
            HistoryDirection::Redo => self.redo(session),
        }
    }
}

/// Whole-document topology change, selection included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyChangeRecord {
    pub label: String,
    pub before: MeshSnapshot,
    pub after: MeshSnapshot,
    /// Before/after view, reverted together with the mesh
    pub view: Option<(ViewSnapshot, ViewSnapshot)>,
}

impl Undoable for TopologyChangeRecord {
    fn label(&self) -> &str {
        &self.label
    }

    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        session.restore_mesh(&self.before)?;
        restore_linked_view(session, self.view.as_ref().map(|(before, _)| before));
        Ok(())
    }

    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        session.restore_mesh(&self.after)?;
        restore_linked_view(session, self.view.as_ref().map(|(_, after)| after));
        Ok(())
    }
}

fn restore_linked_view(session: &mut EditingSession, view: Option<&ViewSnapshot>) {
    if let Some(view) = view {
        session.restore_view(view);
    }
}

/// Selection change, optionally linked with the view change it caused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionChangeRecord {
    pub label: String,
    pub document_id: DocumentId,
    pub before: SelectionSnapshot,
    pub after: SelectionSnapshot,
    /// Before/after view, reverted together with the selection
    pub view: Option<(ViewSnapshot, ViewSnapshot)>,
}

impl Undoable for SelectionChangeRecord {
    fn label(&self) -> &str {
        &self.label
    }

    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        session.restore_selection(self.document_id, &self.before)?;
        if let Some((before, _)) = &self.view {
            session.restore_view(before);
        }
        Ok(())
    }

    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        session.restore_selection(self.document_id, &self.after)?;
        if let Some((_, after)) = &self.view {
            session.restore_view(after);
        }
        Ok(())
    }
}

/// View-only change (camera orbit, tool switch, material pick)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewChangeRecord {
    pub label: String,
    pub before: ViewSnapshot,
    pub after: ViewSnapshot,
}

impl Undoable for ViewChangeRecord {
    fn label(&self) -> &str {
        &self.label
    }

    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        session.restore_view(&self.before);
        Ok(())
    }

    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        session.restore_view(&self.after);
        Ok(())
    }
}

/// Position change of some vertices
///
/// Undo and redo write back only the moved vertices. When the document no
/// longer has the shape the move was recorded against, the whole document
/// is replaced from `before`/`after` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexMoveRecord {
    pub label: String,
    pub document_id: DocumentId,
    pub ids: Vec<VertexId>,
    pub old_positions: Vec<Vec3>,
    pub new_positions: Vec<Vec3>,
    pub before: MeshSnapshot,
    pub after: MeshSnapshot,
    pub view: Option<(ViewSnapshot, ViewSnapshot)>,
}

impl VertexMoveRecord {
    fn restore(
        &self,
        session: &mut EditingSession,
        positions: &[Vec3],
        full: &MeshSnapshot,
        view: Option<&ViewSnapshot>,
    ) -> Result<(), ConsistencyError> {
        let shape = &full.mesh;
        match session.restore_vertex_positions(self.document_id, shape, &self.ids, positions) {
            Ok(()) => {}
            Err(err @ ConsistencyError::MissingDocument(_)) => return Err(err),
            Err(err) => {
                warn!("history: '{}' {}, replacing the whole document", self.label, err);
                session.restore_mesh(full)?;
            }
        }
        restore_linked_view(session, view);
        Ok(())
    }
}

impl Undoable for VertexMoveRecord {
    fn label(&self) -> &str {
        &self.label
    }

    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        let view = self.view.as_ref().map(|(before, _)| before);
        self.restore(session, &self.old_positions, &self.before, view)
    }

    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        let view = self.view.as_ref().map(|(_, after)| after);
        self.restore(session, &self.new_positions, &self.after, view)
    }
}

/// Documents opened/closed and the active index, optionally with the view
///
/// `added` indices refer to the After list, `removed` indices to the
/// Before list; both are sorted ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentListChangeRecord {
    pub label: String,
    pub added: Vec<(usize, DocumentSnapshot)>,
    pub removed: Vec<(usize, DocumentSnapshot)>,
    pub old_active: Option<usize>,
    pub new_active: Option<usize>,
    pub view: Option<(ViewSnapshot, ViewSnapshot)>,
}

impl DocumentListChangeRecord {
    /// Take out `drop`, put back `restore`, then select `active`
    fn transition(
        session: &mut EditingSession,
        drop: &[(usize, DocumentSnapshot)],
        restore: &[(usize, DocumentSnapshot)],
        active: Option<usize>,
        view: Option<&ViewSnapshot>,
    ) {
        for (_, document) in drop {
            session.remove_document_by_id(document.id);
        }
        for (index, document) in restore {
            session.insert_document(*index, document.to_open_document());
        }
        let active = active.filter(|&i| i < session.document_count());
        session.set_active_index(active);
        restore_linked_view(session, view);
    }
}

impl Undoable for DocumentListChangeRecord {
    fn label(&self) -> &str {
        &self.label
    }

    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        Self::transition(
            session,
            &self.added,
            &self.removed,
            self.old_active,
            self.view.as_ref().map(|(before, _)| before),
        );
        Ok(())
    }

    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        Self::transition(
            session,
            &self.removed,
            &self.added,
            self.new_active,
            self.view.as_ref().map(|(_, after)| after),
        );
        Ok(())
    }
}

/// Any record a history stack can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Topology(TopologyChangeRecord),
    Selection(SelectionChangeRecord),
    View(ViewChangeRecord),
    VertexMove(VertexMoveRecord),
    DocumentList(DocumentListChangeRecord),
}

impl Record {
    fn inner(&self) -> &dyn Undoable {
        match self {
            Record::Topology(r) => r,
            Record::Selection(r) => r,
            Record::View(r) => r,
            Record::VertexMove(r) => r,
            Record::DocumentList(r) => r,
        }
    }
}

impl Undoable for Record {
    fn label(&self) -> &str {
        self.inner().label()
    }

    fn undo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        self.inner().undo(session)
    }

    fn redo(&self, session: &mut EditingSession) -> Result<(), ConsistencyError> {
        self.inner().redo(session)
    }
}
