//! One-shot edit commands
//!
//! Menu entries and hotkeys map to an [`EditCommand`]. Each command runs
//! between a Before and an After capture, so a command that changes
//! something leaves exactly one record on the focused stack.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{FaceId, MergeMode, VertexId};
use crate::error::{EditError, ValidationError};
use crate::history::{CaptureKind, UndoController};
use crate::selection::{SelectionMode, SelectionOperations, SelectionSets};
use crate::session::EditingSession;
use polyedit_config::EditorConfig;

/// Commands for the active document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EditCommand {
    /// Replace the selection mode mask
    SetSelectionMode(SelectionMode),
    /// Flip mode bits (an empty result falls back to vertex mode)
    ToggleSelectionMode(SelectionMode),
    /// Select every visible entity of the enabled kinds
    SelectAll,
    DeselectAll,
    /// Deselect if anything is selected, otherwise select all
    ToggleSelectAll,
    /// Swap selected and unselected entities of the enabled kinds
    InvertSelection,
    /// Delete selected faces, lines and vertices
    DeleteSelected,
    /// Merge the vertices touched by the selection
    MergeSelected(MergeMode),
    /// Merge selected vertices closer than the configured threshold
    MergeByDistance,
    /// Hide the selected faces and lines
    HideSelected,
    /// Unhide every face and line
    RevealAll,
    /// Assign a material index to the selected faces
    AssignMaterial(u32),
}

impl EditCommand {
    /// Name shown in the history menu
    pub fn label(&self) -> &'static str {
        match self {
            EditCommand::SetSelectionMode(_) => "Set Selection Mode",
            EditCommand::ToggleSelectionMode(_) => "Toggle Selection Mode",
            EditCommand::SelectAll => "Select All",
            EditCommand::DeselectAll => "Deselect All",
            EditCommand::ToggleSelectAll => "Toggle Select All",
            EditCommand::InvertSelection => "Invert Selection",
            EditCommand::DeleteSelected => "Delete",
            EditCommand::MergeSelected(_) | EditCommand::MergeByDistance => "Merge Vertices",
            EditCommand::HideSelected => "Hide",
            EditCommand::RevealAll => "Reveal",
            EditCommand::AssignMaterial(_) => "Assign Material",
        }
    }

    /// What the command needs captured around it
    pub fn capture_kind(&self) -> CaptureKind {
        match self {
            EditCommand::SetSelectionMode(_) | EditCommand::ToggleSelectionMode(_) => {
                CaptureKind::Selection
            }
            EditCommand::SelectAll
            | EditCommand::DeselectAll
            | EditCommand::ToggleSelectAll
            | EditCommand::InvertSelection => CaptureKind::SelectionWithView,
            EditCommand::DeleteSelected
            | EditCommand::MergeSelected(_)
            | EditCommand::MergeByDistance
            | EditCommand::HideSelected
            | EditCommand::RevealAll
            | EditCommand::AssignMaterial(_) => CaptureKind::Topology,
        }
    }
}

/// Run a command against the active document with history capture
///
/// Returns whether anything changed. Commands that need a document fail
/// with [`ValidationError::NoActiveDocument`]; delete, merge, hide and
/// assign fail with [`ValidationError::EmptySelection`] when nothing is
/// selected. Failed commands change nothing and record nothing.
pub fn execute_command(
    command: EditCommand,
    session: &mut EditingSession,
    history: &mut UndoController,
    config: &EditorConfig,
) -> Result<bool, EditError> {
    let needs_selection = matches!(
        command,
        EditCommand::DeleteSelected
            | EditCommand::MergeSelected(_)
            | EditCommand::MergeByDistance
            | EditCommand::HideSelected
            | EditCommand::AssignMaterial(_)
    );
    let is_mode_change = matches!(
        command,
        EditCommand::SetSelectionMode(_) | EditCommand::ToggleSelectionMode(_)
    );

    if !is_mode_change && session.active_document().is_none() {
        return Err(ValidationError::NoActiveDocument.into());
    }
    if needs_selection && session.selection().is_empty() {
        return Err(ValidationError::EmptySelection.into());
    }

    let operations = SelectionOperations::new(config.hit_test);
    let merge_threshold = config.merge.threshold;
    debug!("command: {:?}", command);

    let (result, recorded) = history.track(
        session,
        command.capture_kind(),
        command.label(),
        |session: &mut EditingSession| -> Result<bool, ValidationError> {
            match command {
                EditCommand::SetSelectionMode(mode) => {
                    Ok(session.selection_mut().set_mode(mode))
                }
                EditCommand::ToggleSelectionMode(bits) => {
                    Ok(session.selection_mut().toggle_mode(bits))
                }
                EditCommand::SelectAll => Ok(select_all(session, &operations)),
                EditCommand::DeselectAll => {
                    let changed = session.selection_mut().clear();
                    Ok(changed)
                }
                EditCommand::ToggleSelectAll => {
                    if session.selection().is_empty() {
                        Ok(select_all(session, &operations))
                    } else {
                        Ok(session.selection_mut().clear())
                    }
                }
                EditCommand::InvertSelection => Ok(invert_selection(session, &operations)),
                EditCommand::DeleteSelected => Ok(delete_selected(session)),
                EditCommand::MergeSelected(mode) => merge_selected(session, mode),
                EditCommand::MergeByDistance => {
                    merge_selected(session, MergeMode::Threshold(merge_threshold))
                }
                EditCommand::HideSelected => Ok(set_selected_hidden(session)),
                EditCommand::RevealAll => Ok(reveal_all(session)),
                EditCommand::AssignMaterial(material) => {
                    Ok(assign_material(session, material))
                }
            }
        },
    )?;

    let changed = result?;
    debug!(
        "command: {:?} changed={} recorded={}",
        command, changed, recorded
    );
    Ok(changed)
}

fn select_all(session: &mut EditingSession, operations: &SelectionOperations) -> bool {
    let Some(document) = session.active_document() else {
        return false;
    };
    let all = operations.all_entities(document, session.selection().mode());
    let changed = session.selection_mut().replace(all);
    session.recompute_pivot();
    changed
}

fn invert_selection(session: &mut EditingSession, operations: &SelectionOperations) -> bool {
    let Some(document) = session.active_document() else {
        return false;
    };
    let all = operations.all_entities(document, session.selection().mode());
    let current = session.selection().sets();
    let inverted = SelectionSets {
        vertices: all.vertices.difference(&current.vertices).copied().collect(),
        edges: all.edges.difference(&current.edges).copied().collect(),
        faces: all.faces.difference(&current.faces).copied().collect(),
        lines: all.lines.difference(&current.lines).copied().collect(),
    };
    let changed = session.selection_mut().replace(inverted);
    session.recompute_pivot();
    changed
}

/// Faces go first (face ids do not affect vertex ids), then vertices
fn delete_selected(session: &mut EditingSession) -> bool {
    let Some((document, selection)) = session.document_and_selection_mut() else {
        return false;
    };

    let mut faces: BTreeSet<FaceId> = selection
        .faces()
        .iter()
        .chain(selection.lines())
        .copied()
        .collect();
    let topology = document.topology();
    for &edge in selection.edges() {
        faces.extend(topology.faces_of_edge(edge));
    }
    let vertices: Vec<VertexId> = selection.vertices().iter().copied().collect();

    let removed_faces = document.remove_faces(faces);
    let removal = document.remove_vertices(vertices);
    selection.clear();
    debug!(
        "delete: removed {} faces, {} vertices (+{} faces)",
        removed_faces, removal.removed_vertices, removal.removed_faces
    );
    removed_faces > 0 || removal.removed_vertices > 0
}

/// Merge and reselect the remapped vertices
fn merge_selected(session: &mut EditingSession, mode: MergeMode) -> Result<bool, ValidationError> {
    let Some((document, selection)) = session.document_and_selection_mut() else {
        return Err(ValidationError::NoActiveDocument);
    };
    let affected = selection.affected_vertices(document);
    let outcome = document.merge_vertices(affected.iter().copied(), mode)?;
    if !outcome.merged_any() {
        return Ok(false);
    }

    let remapped = SelectionSets {
        vertices: affected
            .iter()
            .filter_map(|&v| outcome.removal.remap.get(v))
            .collect(),
        ..SelectionSets::default()
    };
    selection.replace(remapped);
    Ok(true)
}

fn set_selected_hidden(session: &mut EditingSession) -> bool {
    let Some((document, selection)) = session.document_and_selection_mut() else {
        return false;
    };
    let mut changed = false;
    for &face in selection.faces().iter().chain(selection.lines()) {
        changed |= document.set_face_hidden(face, true);
    }
    if changed {
        // Hidden entities cannot stay selected
        let mut sets = selection.sets().clone();
        sets.faces.clear();
        sets.lines.clear();
        selection.replace(sets);
    }
    changed
}

fn reveal_all(session: &mut EditingSession) -> bool {
    let Some(document) = session.active_document_mut() else {
        return false;
    };
    let hidden: Vec<FaceId> = document
        .faces_with_ids()
        .filter(|(_, face)| face.hidden)
        .map(|(id, _)| id)
        .collect();
    for &face in &hidden {
        document.set_face_hidden(face, false);
    }
    !hidden.is_empty()
}

fn assign_material(session: &mut EditingSession, material: u32) -> bool {
    let Some((document, selection)) = session.document_and_selection_mut() else {
        return false;
    };
    let mut changed = false;
    for &face in selection.faces() {
        changed |= document.set_face_material(face, material);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EdgeKey;
    use crate::document::test_fixtures::*;
    use crate::error::StateError;
    use crate::history::HistoryFacet;
    use crate::selection::EntityRef;
    use glam::Vec3;

    fn setup(
        mesh: crate::document::MeshDocument,
    ) -> (EditingSession, UndoController, EditorConfig) {
        let mut session = EditingSession::new();
        session.add_document(mesh);
        (session, UndoController::default(), EditorConfig::default())
    }

    #[test]
    fn test_select_all_and_invert() {
        let (mut session, mut history, config) = setup(quad());
        session.selection_mut().add(EntityRef::Vertex(VertexId(0)));

        assert_eq!(
            execute_command(EditCommand::InvertSelection, &mut session, &mut history, &config),
            Ok(true)
        );
        let selected: Vec<_> = session.selection().vertices().iter().copied().collect();
        assert_eq!(selected, vec![VertexId(1), VertexId(2), VertexId(3)]);

        execute_command(EditCommand::SelectAll, &mut session, &mut history, &config).unwrap();
        assert_eq!(session.selection().len(), 4);
        assert_eq!(session.view().pivot, Vec3::new(0.5, 0.5, 0.0));

        // Already everything: no change, no record
        let before = history.stack(HistoryFacet::Document).len();
        assert_eq!(
            execute_command(EditCommand::SelectAll, &mut session, &mut history, &config),
            Ok(false)
        );
        assert_eq!(history.stack(HistoryFacet::Document).len(), before);
    }

    #[test]
    fn test_toggle_select_all() {
        let (mut session, mut history, config) = setup(quad());
        execute_command(EditCommand::ToggleSelectAll, &mut session, &mut history, &config).unwrap();
        assert_eq!(session.selection().len(), 4);
        execute_command(EditCommand::ToggleSelectAll, &mut session, &mut history, &config).unwrap();
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_delete_requires_selection() {
        let (mut session, mut history, config) = setup(quad());
        assert_eq!(
            execute_command(EditCommand::DeleteSelected, &mut session, &mut history, &config),
            Err(EditError::Validation(ValidationError::EmptySelection))
        );
        assert!(!history.can_undo());
    }

    #[test]
    fn test_no_active_document() {
        let mut session = EditingSession::new();
        let mut history = UndoController::default();
        let config = EditorConfig::default();
        assert_eq!(
            execute_command(EditCommand::SelectAll, &mut session, &mut history, &config),
            Err(EditError::Validation(ValidationError::NoActiveDocument))
        );
    }

    #[test]
    fn test_delete_edge_removes_adjacent_faces() {
        let (mut session, mut history, config) = setup(two_triangles_and_line());
        session.selection_mut().set_mode(SelectionMode::EDGE);
        session
            .selection_mut()
            .add(EntityRef::Edge(EdgeKey::new(VertexId(1), VertexId(2))));

        execute_command(EditCommand::DeleteSelected, &mut session, &mut history, &config).unwrap();
        let document = session.active_document().unwrap();
        assert_eq!(document.face_count(), 1);
        assert!(document.faces()[0].is_line());
        assert_eq!(document.vertex_count(), 5);
        assert!(session.selection().is_empty());

        assert!(history.undo(&mut session));
        assert_eq!(session.active_document().unwrap(), &two_triangles_and_line());
        assert!(session
            .selection()
            .contains(EntityRef::Edge(EdgeKey::new(VertexId(1), VertexId(2)))));
    }

    #[test]
    fn test_merge_by_distance_uses_config() {
        let mut mesh = quad();
        mesh.add_vertex_at(Vec3::new(1.0, 1.0, 0.0005));
        let (mut session, mut history, config) = setup(mesh);
        session.selection_mut().add(EntityRef::Vertex(VertexId(2)));
        session.selection_mut().add(EntityRef::Vertex(VertexId(4)));

        assert_eq!(
            execute_command(EditCommand::MergeByDistance, &mut session, &mut history, &config),
            Ok(true)
        );
        assert_eq!(session.active_document().unwrap().vertex_count(), 4);
        let selected: Vec<_> = session.selection().vertices().iter().copied().collect();
        assert_eq!(selected, vec![VertexId(2)]);
        assert_eq!(history.undo_label(), Some("Merge Vertices"));
    }

    #[test]
    fn test_merge_single_vertex_is_rejected() {
        let (mut session, mut history, config) = setup(quad());
        session.selection_mut().add(EntityRef::Vertex(VertexId(0)));
        assert_eq!(
            execute_command(
                EditCommand::MergeSelected(MergeMode::Forced),
                &mut session,
                &mut history,
                &config
            ),
            Err(EditError::Validation(ValidationError::TooFewVertices {
                count: 1,
                minimum: 2
            }))
        );
        assert!(!history.can_undo());
        assert_eq!(session.active_document().unwrap(), &quad());
    }

    #[test]
    fn test_hide_and_reveal() {
        let (mut session, mut history, config) = setup(quad());
        session.selection_mut().set_mode(SelectionMode::FACE);
        session.selection_mut().add(EntityRef::Face(FaceId(0)));

        execute_command(EditCommand::HideSelected, &mut session, &mut history, &config).unwrap();
        assert!(session.active_document().unwrap().faces()[0].hidden);
        assert!(session.selection().is_empty());

        execute_command(EditCommand::RevealAll, &mut session, &mut history, &config).unwrap();
        assert!(!session.active_document().unwrap().faces()[0].hidden);
        assert_eq!(history.stack(HistoryFacet::Document).len(), 2);
    }

    #[test]
    fn test_command_during_drag_is_refused() {
        let (mut session, mut history, config) = setup(quad());
        history.begin_drag(&session, CaptureKind::Topology).unwrap();
        session.selection_mut().add(EntityRef::Vertex(VertexId(0)));
        assert_eq!(
            execute_command(EditCommand::DeleteSelected, &mut session, &mut history, &config),
            Err(EditError::State(StateError::DragInProgress))
        );
    }
}
