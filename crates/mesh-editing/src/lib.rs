//! Polyedit mesh editing core - document model, selection and history
//!
//! This crate provides the editable state of the mesh editor and the
//! undo/redo engine that operates over it:
//! - [`document`] - Mesh documents with remap-on-mutation topology edits
//! - [`selection`] - Four-kind sub-object selection, hit testing, rect select
//! - [`view`] - Transient camera/tool/material state
//! - [`snapshot`] - Immutable captures with structural comparison
//! - [`history`] - Records, per-facet stacks, focus routing, drag transactions
//! - [`session`] - The explicit editing context every operation receives
//! - [`tools`] - Pointer tool strategy interface and registry
//! - [`commands`] - One-shot edit commands executed with history capture
//!
//! The crate does not depend on a renderer or UI toolkit. Hosts project
//! world positions to the screen through [`selection::Projector`] and drain
//! [`session::SessionEvent`]s to refresh their views.

pub mod commands;
pub mod constants;
pub mod document;
pub mod error;
pub mod history;
pub mod selection;
pub mod session;
pub mod snapshot;
pub mod tools;
pub mod view;

pub use commands::{EditCommand, execute_command};
pub use document::{
    EdgeKey, Face, FaceId, MergeMode, MergeOutcome, MeshDocument, RemovalOutcome, TopologyIndex,
    Vertex, VertexId, VertexRemap,
};
pub use error::{ConsistencyError, EditError, StateError, ValidationError};
pub use history::{
    CaptureKind, Focus, HistoryDirection, HistoryFacet, HistoryStack, Record, UndoController,
};
pub use selection::{
    EntityKind, EntityRef, Projector, ScreenRect, SelectionMode, SelectionOperations,
    SelectionState, SubObjectHit,
};
pub use session::{DocumentId, EditingSession, OpenDocument, SessionEvent};
pub use snapshot::{
    DocumentListSnapshot, DocumentSnapshot, MeshSnapshot, SelectionSnapshot, StateSnapshot,
    ViewSnapshot,
};
pub use tools::{EditTool, PointerEvent, ToolBox, ToolContext, ToolKind, ToolRegistry};
pub use view::{OrbitCamera, ViewState};

pub use polyedit_config::{EditorConfig, HistoryConfig, HitTestConfig, MergeConfig};
