//! End-to-end editing scenarios through the public API.

use glam::{Vec2, Vec3};
use mesh_editing::{
    CaptureKind, DocumentListSnapshot, EditCommand, EditingSession, EditorConfig, EntityRef, Focus,
    HistoryFacet, MergeMode, MeshDocument, SelectionMode, SelectionOperations, SelectionState,
    SessionEvent, StateSnapshot, UndoController, VertexId, execute_command,
};

fn quad() -> MeshDocument {
    MeshDocument::from_polygons(
        "quad",
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        &[&[0, 1, 2, 3]],
    )
}

/// 3x3 vertex grid with four quads and a line along the top
fn grid() -> MeshDocument {
    let mut positions = Vec::new();
    for y in 0..3 {
        for x in 0..3 {
            positions.push(Vec3::new(x as f32, y as f32, 0.0));
        }
    }
    MeshDocument::from_polygons(
        "grid",
        &positions,
        &[&[0, 1, 4, 3], &[1, 2, 5, 4], &[3, 4, 7, 6], &[4, 5, 8, 7], &[6, 8]],
    )
}

fn top_view(world: Vec3) -> Option<Vec2> {
    Some(world.truncate() * 100.0)
}

fn assert_topology_invariant(document: &MeshDocument) {
    assert!(document.validate().is_ok(), "{:?}", document.validate());
    for face in document.faces() {
        let distinct = face.distinct_vertex_count();
        if face.is_line() {
            assert_eq!(distinct, 2);
        } else {
            assert!(distinct >= 3);
        }
        for vertex in &face.vertices {
            assert!(vertex.index() < document.vertex_count());
        }
    }
}

#[test]
fn removing_two_quad_corners_drops_the_face() {
    let mut document = quad();
    let outcome = document.remove_vertices([VertexId(0), VertexId(1)]);

    assert_eq!(document.vertex_count(), 2);
    assert_eq!(document.face_count(), 0);
    assert_eq!(outcome.removed_faces, 1);
    assert_eq!(outcome.remap.get(VertexId(2)), Some(VertexId(0)));
}

#[test]
fn coincident_vertices_merge_into_smallest_id() {
    let mut document = MeshDocument::new("pair");
    let a = document.add_vertex_at(Vec3::new(1.0, 0.0, 0.0));
    let b = document.add_vertex_at(Vec3::new(1.0, 0.0, 0.0));

    let outcome = document
        .merge_vertices([b, a], MergeMode::Threshold(0.001))
        .unwrap();

    assert_eq!(document.vertex_count(), 1);
    assert_eq!(document.position(VertexId(0)), Some(Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(outcome.clusters[0].survivor, a.min(b));
}

#[test]
fn drag_that_returns_to_start_records_nothing() {
    let mut session = EditingSession::new();
    session.add_document(quad());
    let mut history = UndoController::default();

    assert_eq!(history.begin_drag(&session, CaptureKind::VertexMove), Ok(true));
    if let Some(document) = session.active_document_mut() {
        document.set_vertex_position(VertexId(0), Vec3::new(5.0, 0.0, 0.0));
        document.set_vertex_position(VertexId(0), Vec3::ZERO);
    }
    assert!(!history.end_drag(&mut session, CaptureKind::VertexMove, "Move"));
    assert!(history.stack(HistoryFacet::Document).is_empty());
}

#[test]
fn toggling_the_last_mode_bit_falls_back_to_vertex() {
    let mut selection = SelectionState::new();
    assert_eq!(selection.mode(), SelectionMode::VERTEX);

    selection.toggle_mode(SelectionMode::VERTEX);
    assert_eq!(selection.mode(), SelectionMode::VERTEX);

    selection.set_mode(SelectionMode::empty());
    assert!(!selection.mode().is_empty());
}

#[test]
fn undo_with_empty_history_changes_nothing() {
    let mut session = EditingSession::new();
    session.add_document(quad());
    session.take_events();
    let mut history = UndoController::default();
    let before = session.selection().create_snapshot();
    let version = session.selection().version();

    assert!(!history.can_undo());
    assert!(!history.undo(&mut session));

    assert!(session.take_events().is_empty());
    assert_eq!(session.selection().version(), version);
    assert!(!session.selection().create_snapshot().is_different_from(&before));
    assert_eq!(session.active_document(), Some(&quad()));
}

#[test]
fn vertex_priority_beats_a_closer_edge() {
    // Edge v1-v2 runs along screen x = 4; the cursor at x = 3 is 1 unit from
    // it and 3 units from v0.
    let document = MeshDocument::from_polygons(
        "wedge",
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.04, -1.0, 0.0),
            Vec3::new(0.04, 1.0, 0.0),
        ],
        &[&[0, 1, 2]],
    );
    let operations = SelectionOperations::default();
    let cursor = Vec2::new(3.0, 0.0);

    let hit = operations
        .hit_test(cursor, &document, SelectionMode::VERTEX | SelectionMode::EDGE, &top_view)
        .unwrap();
    assert_eq!(hit.entity, EntityRef::Vertex(VertexId(0)));

    let edge_only = operations
        .hit_test(cursor, &document, SelectionMode::EDGE, &top_view)
        .unwrap();
    assert!(matches!(edge_only.entity, EntityRef::Edge(_)));
    assert!(edge_only.screen_distance < hit.screen_distance);
}

#[test]
fn selection_snapshot_round_trip() {
    let mut session = EditingSession::new();
    session.add_document(grid());
    let snapshot = session.selection().create_snapshot();

    session.selection_mut().set_mode(SelectionMode::FACE | SelectionMode::LINE);
    session.selection_mut().add(EntityRef::Vertex(VertexId(4)));
    assert!(session.selection().create_snapshot().is_different_from(&snapshot));

    session.selection_mut().restore_from_snapshot(&snapshot);
    assert!(!session.selection().create_snapshot().is_different_from(&snapshot));
}

#[test]
fn removals_and_merges_keep_topology_valid() {
    for removed in 0..9u32 {
        let mut document = grid();
        document.remove_vertices([VertexId(removed)]);
        assert_topology_invariant(&document);
    }

    let mut document = grid();
    document
        .merge_vertices([VertexId(0), VertexId(1), VertexId(4)], MergeMode::Forced)
        .unwrap();
    assert_topology_invariant(&document);

    let mut document = grid();
    document
        .merge_vertices((0..9).map(VertexId), MergeMode::Threshold(1.0))
        .unwrap();
    assert_eq!(document.vertex_count(), 1);
    assert_eq!(document.face_count(), 0);
    assert_topology_invariant(&document);
}

#[test]
fn drag_coalesces_any_number_of_steps() {
    for steps in [0usize, 1, 7, 50] {
        let mut session = EditingSession::new();
        session.add_document(grid());
        let mut history = UndoController::default();

        history.begin_drag(&session, CaptureKind::VertexMove).unwrap();
        for step in 0..steps {
            if let Some(document) = session.active_document_mut() {
                document.set_vertex_position(VertexId(4), Vec3::new(1.0, 1.0, step as f32 + 1.0));
            }
        }
        let pushed = history.end_drag(&mut session, CaptureKind::VertexMove, "Move");

        let expected = usize::from(steps > 0);
        assert_eq!(usize::from(pushed), expected);
        assert_eq!(history.stack(HistoryFacet::Document).len(), expected);
    }
}

#[test]
fn undo_on_document_list_leaves_vertex_history_alone() {
    let mut session = EditingSession::new();
    let mut history = UndoController::default();

    history.set_focus(Focus::DocumentList);
    history
        .track(&mut session, CaptureKind::DocumentList, "Open", |s| {
            s.add_document(grid())
        })
        .unwrap();

    history.set_focus(Focus::VertexEdit);
    let config = EditorConfig::default();
    execute_command(EditCommand::SelectAll, &mut session, &mut history, &config).unwrap();
    let vertex_stack = history.stack(HistoryFacet::Document).clone();
    assert_eq!(vertex_stack.undo_count(), 1);

    history.set_focus(Focus::DocumentList);
    assert!(history.undo(&mut session));
    assert_eq!(session.document_count(), 0);
    assert_eq!(history.stack(HistoryFacet::Document), &vertex_stack);

    assert!(history.redo(&mut session));
    assert_eq!(session.document_count(), 1);

    // Undo on the vertex stack does not touch the list history
    let list_stack = history.stack(HistoryFacet::DocumentList).clone();
    history.set_focus(Focus::VertexEdit);
    assert!(history.undo(&mut session));
    assert_eq!(history.stack(HistoryFacet::DocumentList), &list_stack);
}

#[test]
fn closing_and_reopening_documents() {
    let mut session = EditingSession::new();
    let mut history = UndoController::default();
    history.set_focus(Focus::DocumentList);

    session.add_document(quad());
    session.add_document(grid());
    session.set_active_index(Some(1));
    let before = DocumentListSnapshot::capture(&session);

    history
        .track(&mut session, CaptureKind::DocumentListWithView, "Close", |s| {
            s.remove_document(1)
        })
        .unwrap();
    assert_eq!(session.active_index(), Some(0));

    session.take_events();
    assert!(history.undo(&mut session));
    assert_eq!(DocumentListSnapshot::capture(&session), before);
    assert_eq!(session.active_document().map(|d| d.name()), Some("grid"));

    let applied = session
        .take_events()
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::HistoryApplied { .. }))
        .count();
    assert_eq!(applied, 1);
}

#[test]
fn closing_a_document_reverts_the_view_with_the_list() {
    let mut session = EditingSession::new();
    let mut history = UndoController::default();
    history.set_focus(Focus::DocumentList);

    session.add_document(quad());
    session.add_document(grid());
    session.view_mut().pivot = Vec3::new(1.0, 1.0, 0.0);
    let view_before = session.view().clone();

    let (_, recorded) = history
        .track(&mut session, CaptureKind::DocumentListWithView, "Close", |s| {
            s.remove_document(0);
            s.view_mut().pivot = Vec3::ZERO;
            s.view_mut().camera.orbit(40.0, 10.0);
        })
        .unwrap();
    assert!(recorded);
    let view_after = session.view().clone();
    assert_ne!(view_after, view_before);

    assert!(history.undo(&mut session));
    assert_eq!(session.document_count(), 2);
    assert_eq!(session.view(), &view_before);

    assert!(history.redo(&mut session));
    assert_eq!(session.document_count(), 1);
    assert_eq!(session.view(), &view_after);
}

#[test]
fn merge_command_undo_restores_mesh_and_selection() {
    let mut session = EditingSession::new();
    session.add_document(grid());
    let mut history = UndoController::default();
    let config = EditorConfig::default();

    session.selection_mut().add(EntityRef::Vertex(VertexId(0)));
    session.selection_mut().add(EntityRef::Vertex(VertexId(1)));
    let selection_before = session.selection().create_snapshot();

    let changed = execute_command(
        EditCommand::MergeSelected(MergeMode::Forced),
        &mut session,
        &mut history,
        &config,
    )
    .unwrap();
    assert!(changed);
    assert_eq!(session.active_document().unwrap().vertex_count(), 8);
    assert_topology_invariant(session.active_document().unwrap());

    assert!(history.undo(&mut session));
    assert_eq!(session.active_document(), Some(&grid()));
    assert_eq!(session.selection().create_snapshot(), selection_before);

    assert!(history.redo(&mut session));
    assert_eq!(session.active_document().unwrap().vertex_count(), 8);
}

#[test]
fn records_serialize_for_persistence() {
    let mut session = EditingSession::new();
    session.add_document(quad());
    let mut history = UndoController::default();

    history
        .track(&mut session, CaptureKind::Topology, "Delete", |s| {
            s.active_document_mut()
                .map(|document| document.remove_vertices([VertexId(3)]))
        })
        .unwrap();

    let record = history
        .stack(HistoryFacet::Document)
        .peek_undo()
        .cloned()
        .unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let restored: mesh_editing::Record = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, record);
}
