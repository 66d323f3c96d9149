//! Before/After captures and their conversion into records.

use glam::Vec3;
use tracing::{debug, warn};

use crate::document::VertexId;
use crate::session::{DocumentId, EditingSession};
use crate::snapshot::{
    DocumentListSnapshot, MeshSnapshot, SelectionSnapshot, StateSnapshot, ViewSnapshot,
};

use super::CaptureKind;
use super::record::{
    DocumentListChangeRecord, Record, SelectionChangeRecord, TopologyChangeRecord,
    VertexMoveRecord, ViewChangeRecord,
};

/// One side of a pending edit
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Capture {
    kind: CaptureKind,
    state: CapturedState,
}

#[derive(Debug, Clone, PartialEq)]
enum CapturedState {
    Mesh {
        mesh: MeshSnapshot,
        view: Option<ViewSnapshot>,
    },
    Selection {
        document_id: DocumentId,
        selection: SelectionSnapshot,
        view: Option<ViewSnapshot>,
    },
    View(ViewSnapshot),
    DocumentList {
        list: DocumentListSnapshot,
        view: Option<ViewSnapshot>,
    },
}

impl Capture {
    /// Capture the state `kind` covers; None if it needs a missing active document
    pub(crate) fn take(kind: CaptureKind, session: &EditingSession) -> Option<Self> {
        let state = match kind {
            CaptureKind::Topology | CaptureKind::VertexMove | CaptureKind::VertexMoveWithView => {
                CapturedState::Mesh {
                    mesh: MeshSnapshot::capture(session)?,
                    view: (kind == CaptureKind::VertexMoveWithView)
                        .then(|| ViewSnapshot::capture(session)),
                }
            }
            CaptureKind::Selection | CaptureKind::SelectionWithView => CapturedState::Selection {
                document_id: session.active_id()?,
                selection: SelectionSnapshot::capture(session),
                view: (kind == CaptureKind::SelectionWithView)
                    .then(|| ViewSnapshot::capture(session)),
            },
            CaptureKind::View => CapturedState::View(ViewSnapshot::capture(session)),
            CaptureKind::DocumentList | CaptureKind::DocumentListWithView => {
                CapturedState::DocumentList {
                    list: DocumentListSnapshot::capture(session),
                    view: (kind == CaptureKind::DocumentListWithView)
                        .then(|| ViewSnapshot::capture(session)),
                }
            }
        };
        Some(Self { kind, state })
    }

    pub(crate) fn kind(&self) -> CaptureKind {
        self.kind
    }

    /// Pair this Before with an After; None when nothing changed
    pub(crate) fn into_record(self, after: Capture, label: &str) -> Option<Record> {
        if self.state == after.state {
            debug!("history: '{}' changed nothing, no record", label);
            return None;
        }
        let label = label.to_string();

        match (self.state, after.state) {
            (
                CapturedState::Mesh {
                    mesh: before,
                    view: view_before,
                },
                CapturedState::Mesh {
                    mesh: after,
                    view: view_after,
                },
            ) => {
                let view = view_before.zip(view_after);
                if matches!(self.kind, CaptureKind::VertexMove | CaptureKind::VertexMoveWithView) {
                    match sparse_move(&before, &after) {
                        Some(moved) => {
                            return Some(Record::VertexMove(VertexMoveRecord {
                                label,
                                document_id: before.document_id,
                                ids: moved.ids,
                                old_positions: moved.old_positions,
                                new_positions: moved.new_positions,
                                before,
                                after,
                                view,
                            }));
                        }
                        None => warn!(
                            "history: '{}' changed topology, recording full document",
                            label
                        ),
                    }
                }
                Some(Record::Topology(TopologyChangeRecord {
                    label,
                    before,
                    after,
                    view,
                }))
            }
            (
                CapturedState::Selection {
                    document_id,
                    selection: before,
                    view: view_before,
                },
                CapturedState::Selection {
                    document_id: after_document,
                    selection: after,
                    view: view_after,
                },
            ) => {
                if document_id != after_document {
                    warn!(
                        "history: '{}' switched documents mid-capture, no selection record",
                        label
                    );
                    return None;
                }
                Some(Record::Selection(SelectionChangeRecord {
                    label,
                    document_id,
                    before,
                    after,
                    view: view_before.zip(view_after),
                }))
            }
            (CapturedState::View(before), CapturedState::View(after)) => {
                Some(Record::View(ViewChangeRecord {
                    label,
                    before,
                    after,
                }))
            }
            (
                CapturedState::DocumentList {
                    list: before,
                    view: view_before,
                },
                CapturedState::DocumentList {
                    list: after,
                    view: view_after,
                },
            ) => Some(Record::DocumentList(DocumentListChangeRecord {
                label,
                added: after.missing_from(&before),
                removed: before.missing_from(&after),
                old_active: before.active,
                new_active: after.active,
                view: view_before.zip(view_after),
            })),
            _ => {
                warn!("history: '{}' paired captures of different kinds", label);
                None
            }
        }
    }
}

/// Positions that differ between two meshes of the same shape
struct MovedVertices {
    ids: Vec<VertexId>,
    old_positions: Vec<Vec3>,
    new_positions: Vec<Vec3>,
}

/// Sparse position delta if only positions differ between the two meshes
fn sparse_move(before: &MeshSnapshot, after: &MeshSnapshot) -> Option<MovedVertices> {
    let same_shape = before.document_id == after.document_id
        && before.mesh.name() == after.mesh.name()
        && before.mesh.faces() == after.mesh.faces()
        && before.mesh.vertex_count() == after.mesh.vertex_count()
        && !before.selection.is_different_from(&after.selection);
    if !same_shape {
        return None;
    }

    let mut moved = MovedVertices {
        ids: Vec::new(),
        old_positions: Vec::new(),
        new_positions: Vec::new(),
    };
    for (index, (old, new)) in before
        .mesh
        .vertices()
        .iter()
        .zip(after.mesh.vertices())
        .enumerate()
    {
        if old.uvs != new.uvs || old.normals != new.normals {
            return None;
        }
        if old.position != new.position {
            moved.ids.push(VertexId(index as u32));
            moved.old_positions.push(old.position);
            moved.new_positions.push(new.position);
        }
    }
    Some(moved)
}
