//! Error taxonomy for mesh editing.
//!
//! No error here is fatal. Validation failures turn the operation into a
//! no-op, consistency failures are resolved by replacing whole state, and
//! state failures surface to the UI as disabled actions.

use crate::document::{FaceId, VertexId};
use crate::history::CaptureKind;
use crate::session::DocumentId;

/// Bad input to an edit; the edit does nothing and no record is pushed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Vertex {vertex:?} out of range (vertex count {vertex_count})")]
    VertexOutOfRange {
        vertex: VertexId,
        vertex_count: usize,
    },
    #[error(
        "Face {face:?} references vertex {vertex:?} out of range (vertex count {vertex_count})"
    )]
    FaceVertexOutOfRange {
        face: FaceId,
        vertex: VertexId,
        vertex_count: usize,
    },
    #[error("Face {face:?} has {distinct} distinct vertices, needs {minimum}")]
    DegenerateFace {
        face: FaceId,
        distinct: usize,
        minimum: usize,
    },
    #[error("Face {face:?} has {actual} {attribute} indices for {expected} corners")]
    AttributeLengthMismatch {
        face: FaceId,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Operation needs at least {minimum} vertices, got {count}")]
    TooFewVertices { count: usize, minimum: usize },
    #[error("No active document")]
    NoActiveDocument,
    #[error("Nothing is selected")]
    EmptySelection,
}

/// Captured state contradicts the live state it is applied to.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("Expected {expected} vertices, document has {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },
    #[error("Document faces differ from the recorded shape")]
    FacesChanged,
    #[error("Document {0:?} is not open")]
    MissingDocument(DocumentId),
}

/// History requested in a state that cannot serve it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
    #[error("A {0:?} drag is already pending - call end_drag() or cancel_drag() first")]
    DragAlreadyPending(CaptureKind),
    #[error("A drag transaction is in progress")]
    DragInProgress,
}

/// Any failure raised by the editing layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("State error: {0}")]
    State(#[from] StateError),
}
