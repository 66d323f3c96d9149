//! Editing session: the explicit context every edit operates on
//!
//! The session owns the open documents, which one is active, the selection
//! of the active document, the view state and an outbound event queue. The
//! host drains the queue once per frame with [`EditingSession::take_events`].

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::{MeshDocument, VertexId};
use crate::error::ConsistencyError;
use crate::history::{HistoryDirection, HistoryFacet};
use crate::selection::SelectionState;
use crate::snapshot::{MeshSnapshot, SelectionSnapshot, ViewSnapshot};
use crate::view::ViewState;

/// Stable handle of an open document
///
/// Indices shift when documents are added or removed; ids do not, so
/// history records address documents by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// An entry of the open-document list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenDocument {
    pub id: DocumentId,
    pub mesh: MeshDocument,
}

/// Outbound notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DocumentAdded { id: DocumentId, index: usize },
    DocumentRemoved { id: DocumentId, index: usize },
    ActiveDocumentChanged { id: Option<DocumentId> },
    /// One per successful undo/redo, after all state has been restored
    HistoryApplied {
        facet: HistoryFacet,
        direction: HistoryDirection,
        label: String,
    },
    RecordPushed { facet: HistoryFacet, label: String },
}

/// The editing context
#[derive(Debug, Default)]
pub struct EditingSession {
    documents: Vec<OpenDocument>,
    active: Option<usize>,
    selection: SelectionState,
    view: ViewState,
    events: Vec<SessionEvent>,
    next_id: u64,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Document list
    // ========================================================================

    /// Append a document; it becomes active if nothing was
    pub fn add_document(&mut self, mesh: MeshDocument) -> DocumentId {
        let id = DocumentId(self.next_id);
        self.next_id += 1;
        let index = self.documents.len();
        self.documents.push(OpenDocument { id, mesh });
        self.events.push(SessionEvent::DocumentAdded { id, index });
        debug!("session: added document {:?} at {}", id, index);

        if self.active.is_none() {
            self.set_active_index(Some(index));
        }
        id
    }

    /// Remove the document at `index`
    ///
    /// Removing the active document activates its neighbour (or nothing)
    /// and resets the selection.
    pub fn remove_document(&mut self, index: usize) -> Option<OpenDocument> {
        if index >= self.documents.len() {
            return None;
        }
        let active_id = self.active_id();
        let removed = self.documents.remove(index);
        self.events.push(SessionEvent::DocumentRemoved {
            id: removed.id,
            index,
        });
        debug!("session: removed document {:?} from {}", removed.id, index);

        if active_id == Some(removed.id) {
            self.active = None;
            self.selection.reset();
            let next = (!self.documents.is_empty()).then(|| index.min(self.documents.len() - 1));
            if !self.set_active_index(next) {
                self.events
                    .push(SessionEvent::ActiveDocumentChanged { id: None });
            }
        } else if let Some(active) = self.active {
            if index < active {
                self.active = Some(active - 1);
            }
        }
        Some(removed)
    }

    pub fn documents(&self) -> &[OpenDocument] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn index_of(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }

    pub fn document(&self, id: DocumentId) -> Option<&OpenDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    // ========================================================================
    // Active document
    // ========================================================================

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&OpenDocument> {
        self.active.and_then(|i| self.documents.get(i))
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active().map(|d| d.id)
    }

    pub fn active_document(&self) -> Option<&MeshDocument> {
        self.active().map(|d| &d.mesh)
    }

    pub fn active_document_mut(&mut self) -> Option<&mut MeshDocument> {
        let index = self.active?;
        self.documents.get_mut(index).map(|d| &mut d.mesh)
    }

    /// Active document and selection borrowed together
    pub fn document_and_selection_mut(
        &mut self,
    ) -> Option<(&mut MeshDocument, &mut SelectionState)> {
        let index = self.active?;
        let document = self.documents.get_mut(index)?;
        Some((&mut document.mesh, &mut self.selection))
    }

    /// Switch the active document; the selection is reset on change
    ///
    /// Out-of-range indices are ignored.
    pub fn set_active_index(&mut self, index: Option<usize>) -> bool {
        if index.is_some_and(|i| i >= self.documents.len()) {
            warn!("session: active index {:?} out of range", index);
            return false;
        }
        if self.active == index {
            return false;
        }
        self.active = index;
        self.selection.reset();
        self.events.push(SessionEvent::ActiveDocumentChanged {
            id: self.active_id(),
        });
        debug!("session: active document now {:?}", self.active_id());
        true
    }

    // ========================================================================
    // Selection and view
    // ========================================================================

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Move the pivot to the centroid of the selected vertices
    ///
    /// Returns false (pivot untouched) when nothing is selected.
    pub fn recompute_pivot(&mut self) -> bool {
        let Some(document) = self.active.and_then(|i| self.documents.get(i)) else {
            return false;
        };
        let positions: Vec<Vec3> = self
            .selection
            .affected_vertices(&document.mesh)
            .into_iter()
            .filter_map(|v| document.mesh.position(v))
            .collect();
        self.view.set_pivot_to_centroid(positions)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // History restore
    // ========================================================================

    /// Replace a document's mesh and selection from a capture
    ///
    /// The document becomes active so the restored selection refers to it.
    pub(crate) fn restore_mesh(&mut self, snapshot: &MeshSnapshot) -> Result<(), ConsistencyError> {
        let index = self.require(snapshot.document_id)?;
        self.set_active_index(Some(index));
        self.documents[index].mesh.replace_with(&snapshot.mesh);
        self.selection.restore_from_snapshot(&snapshot.selection);
        Ok(())
    }

    /// Restore the selection of a document
    pub(crate) fn restore_selection(
        &mut self,
        document_id: DocumentId,
        snapshot: &SelectionSnapshot,
    ) -> Result<(), ConsistencyError> {
        let index = self.require(document_id)?;
        self.set_active_index(Some(index));
        self.selection.restore_from_snapshot(snapshot);
        Ok(())
    }

    pub(crate) fn restore_view(&mut self, snapshot: &ViewSnapshot) {
        self.view = snapshot.view.clone();
    }

    /// Write back sparse vertex positions
    ///
    /// The document must still have the vertex count and faces of `shape`;
    /// otherwise nothing is written.
    pub(crate) fn restore_vertex_positions(
        &mut self,
        document_id: DocumentId,
        shape: &MeshDocument,
        ids: &[VertexId],
        positions: &[Vec3],
    ) -> Result<(), ConsistencyError> {
        let index = self.require(document_id)?;
        let mesh = &mut self.documents[index].mesh;
        if mesh.vertex_count() != shape.vertex_count() {
            return Err(ConsistencyError::VertexCountMismatch {
                expected: shape.vertex_count(),
                actual: mesh.vertex_count(),
            });
        }
        if mesh.faces() != shape.faces() {
            return Err(ConsistencyError::FacesChanged);
        }
        for (&id, &position) in ids.iter().zip(positions) {
            mesh.set_vertex_position(id, position);
        }
        self.set_active_index(Some(index));
        Ok(())
    }

    /// Insert a document at `index` (clamped); no-op if the id is already open
    pub(crate) fn insert_document(&mut self, index: usize, document: OpenDocument) -> bool {
        if self.index_of(document.id).is_some() {
            return false;
        }
        let index = index.min(self.documents.len());
        let id = document.id;
        self.next_id = self.next_id.max(id.0 + 1);
        self.documents.insert(index, document);
        if let Some(active) = self.active {
            if index <= active {
                self.active = Some(active + 1);
            }
        }
        self.events.push(SessionEvent::DocumentAdded { id, index });
        true
    }

    /// Remove a document by id; no-op if it is not open
    pub(crate) fn remove_document_by_id(&mut self, id: DocumentId) -> bool {
        match self.index_of(id) {
            Some(index) => self.remove_document(index).is_some(),
            None => false,
        }
    }

    /// Post-apply pipeline shared by undo and redo
    pub(crate) fn finish_history_apply(
        &mut self,
        facet: HistoryFacet,
        direction: HistoryDirection,
        label: &str,
    ) {
        if let Some(index) = self.active {
            if let Some(document) = self.documents.get_mut(index) {
                document.mesh.invalidate_topology();
                self.selection.retain_valid(&document.mesh);
            }
        }
        self.events.push(SessionEvent::HistoryApplied {
            facet,
            direction,
            label: label.to_string(),
        });
    }

    fn require(&self, id: DocumentId) -> Result<usize, ConsistencyError> {
        self.index_of(id)
            .ok_or(ConsistencyError::MissingDocument(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FaceId;
    use crate::document::test_fixtures::*;
    use crate::selection::EntityRef;

    #[test]
    fn test_first_document_becomes_active() {
        let mut session = EditingSession::new();
        assert!(session.active_document().is_none());

        let id = session.add_document(quad());
        session.add_document(two_triangles_and_line());

        assert_eq!(session.active_id(), Some(id));
        let events = session.take_events();
        assert_eq!(events.len(), 3);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_switch_resets_selection() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        session.add_document(quad());
        session.selection_mut().add(EntityRef::Vertex(VertexId(0)));

        assert!(session.set_active_index(Some(1)));
        assert!(session.selection().is_empty());
        assert!(!session.set_active_index(Some(7)));
        assert_eq!(session.active_index(), Some(1));
    }

    #[test]
    fn test_remove_keeps_active_document() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        let b = session.add_document(quad());
        session.set_active_index(Some(1));
        session.selection_mut().add(EntityRef::Vertex(VertexId(2)));

        session.remove_document(0);
        assert_eq!(session.active_id(), Some(b));
        assert_eq!(session.active_index(), Some(0));
        assert_eq!(session.selection().len(), 1);
    }

    #[test]
    fn test_remove_active_falls_back() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        session.selection_mut().add(EntityRef::Vertex(VertexId(2)));

        session.remove_document(0);
        assert_eq!(session.active_index(), None);
        assert!(session.selection().is_empty());
        assert!(session.remove_document(0).is_none());
    }

    #[test]
    fn test_recompute_pivot() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        assert!(!session.recompute_pivot());

        session.selection_mut().add(EntityRef::Vertex(VertexId(1)));
        session.selection_mut().add(EntityRef::Vertex(VertexId(2)));
        assert!(session.recompute_pivot());
        assert_eq!(session.view().pivot, Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_restore_vertex_positions_rejects_shape_change() {
        let mut session = EditingSession::new();
        let id = session.add_document(quad());
        let mut larger = quad();
        larger.add_vertex_at(Vec3::ONE);
        let result = session.restore_vertex_positions(id, &larger, &[VertexId(0)], &[Vec3::ONE]);

        assert_eq!(
            result,
            Err(ConsistencyError::VertexCountMismatch {
                expected: 5,
                actual: 4
            })
        );
        assert_eq!(session.active_document().unwrap().position(VertexId(0)), Some(Vec3::ZERO));

        let mut rewired = quad();
        rewired.remove_faces([FaceId(0)]);
        let result = session.restore_vertex_positions(id, &rewired, &[VertexId(0)], &[Vec3::ONE]);
        assert_eq!(result, Err(ConsistencyError::FacesChanged));
    }
}
