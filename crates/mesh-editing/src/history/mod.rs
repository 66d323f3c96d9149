//! Undo/redo for mesh editing
//!
//! Edits are recorded as Before/After snapshot pairs ([`Record`]) on one of
//! several independent stacks. The UI's logical [`Focus`] decides which
//! stack receives new records and serves undo/redo, so unrelated facets of
//! state never interleave in one history.
//!
//! Continuous gestures are bracketed by `begin_drag` / `end_drag` and
//! coalesce into at most one record.

mod capture;
mod controller;
mod record;
mod stack;

use serde::{Deserialize, Serialize};

pub use controller::UndoController;
pub use record::{
    DocumentListChangeRecord, Record, SelectionChangeRecord, TopologyChangeRecord, Undoable,
    VertexMoveRecord, ViewChangeRecord,
};
pub use stack::HistoryStack;

/// An independently undoable dimension of state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryFacet {
    /// Topology, vertex and selection edits of documents
    Document,
    /// Opening, closing and switching documents
    DocumentList,
    /// Camera, pivot, tool and material
    View,
}

impl HistoryFacet {
    pub const ALL: [HistoryFacet; 3] = [
        HistoryFacet::Document,
        HistoryFacet::DocumentList,
        HistoryFacet::View,
    ];
}

/// Which part of the UI has logical focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Focus {
    /// Editing vertices, edges and faces in the viewport
    #[default]
    VertexEdit,
    /// Browsing the open-document list
    DocumentList,
    /// Orbiting the camera
    Camera,
}

impl Focus {
    /// Stack served while this focus is active
    pub fn facet(self) -> HistoryFacet {
        match self {
            Focus::VertexEdit => HistoryFacet::Document,
            Focus::DocumentList => HistoryFacet::DocumentList,
            Focus::Camera => HistoryFacet::View,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

/// What a Before/After capture contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Full mesh of the active document plus its selection
    Topology,
    /// Full mesh while dragging; recorded sparsely when only positions moved
    VertexMove,
    /// Vertex move plus the view it affects (the pivot follows the vertices)
    VertexMoveWithView,
    /// Selection of the active document
    Selection,
    /// Selection plus the view it affects (e.g. a recomputed pivot)
    SelectionWithView,
    /// View state only
    View,
    /// The open-document list and active index
    DocumentList,
    /// Document list plus the view it affects
    DocumentListWithView,
}

impl CaptureKind {
    /// Facet the captured state belongs to
    pub fn facet(self) -> HistoryFacet {
        match self {
            CaptureKind::Topology
            | CaptureKind::VertexMove
            | CaptureKind::VertexMoveWithView
            | CaptureKind::Selection
            | CaptureKind::SelectionWithView => HistoryFacet::Document,
            CaptureKind::View => HistoryFacet::View,
            CaptureKind::DocumentList | CaptureKind::DocumentListWithView => {
                HistoryFacet::DocumentList
            }
        }
    }

    /// Whether capturing needs an active document
    pub fn needs_active_document(self) -> bool {
        self.facet() == HistoryFacet::Document
    }
}
