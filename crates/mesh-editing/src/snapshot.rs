//! Immutable state captures
//!
//! A snapshot is a deep copy taken at one instant. Nothing in a snapshot
//! aliases live state, so later in-place edits never reach it.

use serde::{Deserialize, Serialize};

use crate::document::MeshDocument;
use crate::selection::{SelectionMode, SelectionSets};
use crate::session::{DocumentId, EditingSession, OpenDocument};
use crate::view::ViewState;

/// Structural comparison shared by all snapshot types
pub trait StateSnapshot: Clone + PartialEq {
    /// Whether restoring `other` would change anything relative to `self`
    fn is_different_from(&self, other: &Self) -> bool {
        self != other
    }
}

/// The four selection sets plus the mode mask
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub sets: SelectionSets,
    pub mode: SelectionMode,
}

impl StateSnapshot for SelectionSnapshot {}

impl SelectionSnapshot {
    pub fn capture(session: &EditingSession) -> Self {
        session.selection().create_snapshot()
    }
}

/// Camera, pivot, tool and material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub view: ViewState,
}

impl StateSnapshot for ViewSnapshot {}

impl ViewSnapshot {
    pub fn capture(session: &EditingSession) -> Self {
        Self {
            view: session.view().clone(),
        }
    }
}

/// One document's full mesh, with the selection made on it
///
/// Topology and selection always restore together: selection ids are only
/// meaningful against the topology they were captured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub document_id: DocumentId,
    pub mesh: MeshDocument,
    pub selection: SelectionSnapshot,
}

impl StateSnapshot for MeshSnapshot {}

impl MeshSnapshot {
    /// Capture the active document; None when no document is active
    pub fn capture(session: &EditingSession) -> Option<Self> {
        let active = session.active()?;
        Some(Self {
            document_id: active.id,
            mesh: active.mesh.clone(),
            selection: session.selection().create_snapshot(),
        })
    }
}

/// A document as an entry of the open-document list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub id: DocumentId,
    pub mesh: MeshDocument,
}

impl StateSnapshot for DocumentSnapshot {}

impl From<&OpenDocument> for DocumentSnapshot {
    fn from(document: &OpenDocument) -> Self {
        Self {
            id: document.id,
            mesh: document.mesh.clone(),
        }
    }
}

impl DocumentSnapshot {
    pub fn to_open_document(&self) -> OpenDocument {
        OpenDocument {
            id: self.id,
            mesh: self.mesh.clone(),
        }
    }
}

/// The open-document list and the active index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentListSnapshot {
    pub documents: Vec<DocumentSnapshot>,
    pub active: Option<usize>,
}

impl StateSnapshot for DocumentListSnapshot {}

impl DocumentListSnapshot {
    pub fn capture(session: &EditingSession) -> Self {
        Self {
            documents: session.documents().iter().map(DocumentSnapshot::from).collect(),
            active: session.active_index(),
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.documents.iter().map(|d| d.id)
    }

    fn contains(&self, id: DocumentId) -> bool {
        self.documents.iter().any(|d| d.id == id)
    }

    /// Entries of `self` missing from `other`, with their index in `self`
    pub fn missing_from(&self, other: &DocumentListSnapshot) -> Vec<(usize, DocumentSnapshot)> {
        self.documents
            .iter()
            .enumerate()
            .filter(|(_, d)| !other.contains(d.id))
            .map(|(index, d)| (index, d.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::VertexId;
    use crate::document::test_fixtures::*;
    use crate::selection::EntityRef;
    use glam::Vec3;

    #[test]
    fn test_mesh_snapshot_needs_active_document() {
        let session = EditingSession::new();
        assert!(MeshSnapshot::capture(&session).is_none());
    }

    #[test]
    fn test_mesh_snapshot_is_independent() {
        let mut session = EditingSession::new();
        session.add_document(quad());
        session.selection_mut().add(EntityRef::Vertex(VertexId(1)));

        let snapshot = MeshSnapshot::capture(&session).unwrap();
        if let Some(mesh) = session.active_document_mut() {
            mesh.set_vertex_position(VertexId(1), Vec3::splat(3.0));
        }
        session.selection_mut().clear();

        assert_eq!(snapshot.mesh.position(VertexId(1)), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert!(snapshot.selection.sets.vertices.contains(&VertexId(1)));
        assert!(MeshSnapshot::capture(&session).unwrap().is_different_from(&snapshot));
    }

    #[test]
    fn test_document_list_diff() {
        let mut session = EditingSession::new();
        let a = session.add_document(quad());
        session.add_document(two_triangles_and_line());
        let before = DocumentListSnapshot::capture(&session);

        session.remove_document(0);
        let c = session.add_document(MeshDocument::new("c"));
        let after = DocumentListSnapshot::capture(&session);

        let removed = before.missing_from(&after);
        let added = after.missing_from(&before);
        assert_eq!(removed.len(), 1);
        assert_eq!((removed[0].0, removed[0].1.id), (0, a));
        assert_eq!(added.len(), 1);
        assert_eq!((added[0].0, added[0].1.id), (1, c));
    }
}
