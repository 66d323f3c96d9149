//! Sub-object selection for mesh editing
//!
//! Four entity kinds can be selected independently: vertices, edges (derived
//! from polygon faces), polygon faces, and line entities. A bitmask controls
//! which kinds hit testing and box selection consider.
//!
//! Selection holds raw indices into the active document. Edits that renumber
//! vertices or faces never patch these sets; history restores a whole
//! selection snapshot alongside the topology it was captured with.

mod accelerator;

use std::collections::BTreeSet;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{EdgeKey, FaceId, MeshDocument, VertexId};
use crate::snapshot::SelectionSnapshot;

pub use accelerator::{
    CpuAccelerator, HitTestAccelerator, HitTestBuffers, ScreenFace, ScreenSegment, ScreenVertex,
};
pub use hit_test::{Projector, ScreenRect, SelectionOperations, SubObjectHit};

bitflags! {
    /// Entity kinds enabled for picking
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SelectionMode: u8 {
        const VERTEX = 0b0001;
        const EDGE = 0b0010;
        const FACE = 0b0100;
        const LINE = 0b1000;
    }
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self::VERTEX
    }
}

impl SelectionMode {
    /// Replace an empty mask with vertex mode
    pub fn sanitized(self) -> Self {
        if self.is_empty() { Self::VERTEX } else { self }
    }

    /// Enabled kinds in hit-test priority order
    pub fn kinds(self) -> impl Iterator<Item = EntityKind> {
        EntityKind::PRIORITY
            .into_iter()
            .filter(move |kind| self.contains(kind.mode_bit()))
    }
}

/// Selectable entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Vertex,
    Edge,
    Face,
    Line,
}

impl EntityKind {
    /// Hit-test priority: vertex > edge > face > line
    pub const PRIORITY: [EntityKind; 4] = [
        EntityKind::Vertex,
        EntityKind::Edge,
        EntityKind::Face,
        EntityKind::Line,
    ];

    pub fn mode_bit(self) -> SelectionMode {
        match self {
            EntityKind::Vertex => SelectionMode::VERTEX,
            EntityKind::Edge => SelectionMode::EDGE,
            EntityKind::Face => SelectionMode::FACE,
            EntityKind::Line => SelectionMode::LINE,
        }
    }
}

/// One selectable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Vertex(VertexId),
    Edge(EdgeKey),
    /// Polygon face
    Face(FaceId),
    /// 2-vertex line entity (also a face in the document)
    Line(FaceId),
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Vertex(_) => EntityKind::Vertex,
            EntityRef::Edge(_) => EntityKind::Edge,
            EntityRef::Face(_) => EntityKind::Face,
            EntityRef::Line(_) => EntityKind::Line,
        }
    }
}

/// The four selected-id sets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSets {
    pub vertices: BTreeSet<VertexId>,
    pub edges: BTreeSet<EdgeKey>,
    pub faces: BTreeSet<FaceId>,
    pub lines: BTreeSet<FaceId>,
}

impl SelectionSets {
    pub fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Vertex(id) => self.vertices.contains(&id),
            EntityRef::Edge(edge) => self.edges.contains(&edge),
            EntityRef::Face(id) => self.faces.contains(&id),
            EntityRef::Line(id) => self.lines.contains(&id),
        }
    }

    /// Returns true if the entity was newly inserted
    pub fn insert(&mut self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Vertex(id) => self.vertices.insert(id),
            EntityRef::Edge(edge) => self.edges.insert(edge),
            EntityRef::Face(id) => self.faces.insert(id),
            EntityRef::Line(id) => self.lines.insert(id),
        }
    }

    /// Returns true if the entity was present
    pub fn remove(&mut self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Vertex(id) => self.vertices.remove(&id),
            EntityRef::Edge(edge) => self.edges.remove(&edge),
            EntityRef::Face(id) => self.faces.remove(&id),
            EntityRef::Line(id) => self.lines.remove(&id),
        }
    }

    /// Add everything from `other`; returns the number of new entries
    pub fn union_with(&mut self, other: &SelectionSets) -> usize {
        let before = self.len();
        self.vertices.extend(other.vertices.iter().copied());
        self.edges.extend(other.edges.iter().copied());
        self.faces.extend(other.faces.iter().copied());
        self.lines.extend(other.lines.iter().copied());
        self.len() - before
    }

    pub fn len(&self) -> usize {
        self.vertices.len() + self.edges.len() + self.faces.len() + self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
        self.faces.clear();
        self.lines.clear();
    }
}

/// Payload handed to selection listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub version: u64,
    pub mode: SelectionMode,
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
    pub line_count: usize,
}

/// Handle returned by [`SelectionState::on_change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&SelectionChange)>;

/// Live selection of the active document
///
/// Every public mutator that changes something bumps `version` and notifies
/// listeners exactly once; calls that change nothing stay silent.
pub struct SelectionState {
    sets: SelectionSets,
    mode: SelectionMode,
    version: u64,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            sets: SelectionSets::default(),
            mode: SelectionMode::VERTEX,
            version: 0,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }
}

impl fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionState")
            .field("sets", &self.sets)
            .field("mode", &self.mode)
            .field("version", &self.version)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn sets(&self) -> &SelectionSets {
        &self.sets
    }

    pub fn vertices(&self) -> &BTreeSet<VertexId> {
        &self.sets.vertices
    }

    pub fn edges(&self) -> &BTreeSet<EdgeKey> {
        &self.sets.edges
    }

    pub fn faces(&self) -> &BTreeSet<FaceId> {
        &self.sets.faces
    }

    pub fn lines(&self) -> &BTreeSet<FaceId> {
        &self.sets.lines
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.sets.contains(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total selected entities across all kinds
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Change counter, bumped once per effective mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    // ========================================================================
    // Entity mutation
    // ========================================================================

    pub fn add(&mut self, entity: EntityRef) -> bool {
        let changed = self.sets.insert(entity);
        self.commit(changed)
    }

    pub fn remove(&mut self, entity: EntityRef) -> bool {
        let changed = self.sets.remove(entity);
        self.commit(changed)
    }

    /// Flip membership; returns whether the entity is selected afterwards
    pub fn toggle(&mut self, entity: EntityRef) -> bool {
        let selected = if self.sets.remove(entity) {
            false
        } else {
            self.sets.insert(entity);
            true
        };
        self.commit(true);
        selected
    }

    /// Clear all four sets
    pub fn clear(&mut self) -> bool {
        let changed = !self.sets.is_empty();
        self.sets.clear();
        self.commit(changed)
    }

    /// Clear everything and select one entity
    pub fn select_only(&mut self, entity: EntityRef) -> bool {
        let changed = self.sets.len() != 1 || !self.sets.contains(entity);
        if changed {
            self.sets.clear();
            self.sets.insert(entity);
        }
        self.commit(changed)
    }

    /// Add several entities in one notification
    pub fn extend(&mut self, entities: impl IntoIterator<Item = EntityRef>) -> usize {
        let added = entities
            .into_iter()
            .filter(|&entity| self.sets.insert(entity))
            .count();
        self.commit(added > 0);
        added
    }

    /// Union another set collection into this one
    pub fn union_with(&mut self, other: &SelectionSets) -> bool {
        let added = self.sets.union_with(other);
        self.commit(added > 0)
    }

    /// Replace all four sets
    pub fn replace(&mut self, sets: SelectionSets) -> bool {
        let changed = self.sets != sets;
        self.sets = sets;
        self.commit(changed)
    }

    /// Clear the sets on document switch; the mode is a UI preference and stays
    pub fn reset(&mut self) -> bool {
        self.clear()
    }

    // ========================================================================
    // Mode
    // ========================================================================

    /// Set the mode mask; an empty mask falls back to vertex mode
    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        let mode = mode.sanitized();
        let changed = self.mode != mode;
        self.mode = mode;
        self.commit(changed)
    }

    /// Flip the given bits; clearing the last bit falls back to vertex mode
    pub fn toggle_mode(&mut self, bits: SelectionMode) -> bool {
        self.set_mode(self.mode.symmetric_difference(bits))
    }

    /// Turn the given bits on
    pub fn enable_mode(&mut self, bits: SelectionMode) -> bool {
        self.set_mode(self.mode.union(bits))
    }

    // ========================================================================
    // Snapshots and document sync
    // ========================================================================

    pub fn create_snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            sets: self.sets.clone(),
            mode: self.mode,
        }
    }

    /// Restore sets and mode as a whole
    pub fn restore_from_snapshot(&mut self, snapshot: &SelectionSnapshot) -> bool {
        let mode = snapshot.mode.sanitized();
        let changed = self.sets != snapshot.sets || self.mode != mode;
        if changed {
            self.sets = snapshot.sets.clone();
            self.mode = mode;
        }
        self.commit(changed)
    }

    /// Every vertex touched by the selection
    ///
    /// Edges expand to their endpoints, faces and lines to their corners.
    /// Ids that no longer exist in `document` are skipped.
    pub fn affected_vertices(&self, document: &MeshDocument) -> BTreeSet<VertexId> {
        let topology = document.topology();
        let mut affected: BTreeSet<VertexId> = self
            .sets
            .vertices
            .iter()
            .copied()
            .filter(|&v| document.contains_vertex(v))
            .collect();

        for edge in &self.sets.edges {
            affected.extend(edge.vertices().into_iter().filter(|&v| document.contains_vertex(v)));
        }
        affected.extend(
            topology.vertices_of_faces(self.sets.faces.iter().chain(&self.sets.lines).copied()),
        );
        affected
    }

    /// Drop ids that do not exist in `document`
    ///
    /// Edges must still be polygon edges, faces must still be polygons and
    /// lines must still be lines.
    pub fn retain_valid(&mut self, document: &MeshDocument) -> bool {
        let before = self.sets.len();
        let topology = document.topology();

        self.sets.vertices.retain(|&v| document.contains_vertex(v));
        self.sets.edges.retain(|&edge| topology.contains_edge(edge));
        self.sets
            .faces
            .retain(|&f| document.face(f).is_some_and(|face| face.is_polygon()));
        self.sets
            .lines
            .retain(|&f| document.face(f).is_some_and(|face| face.is_line()));

        let dropped = before - self.sets.len();
        if dropped > 0 {
            debug!("selection: dropped {} stale ids", dropped);
        }
        self.commit(dropped > 0)
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Register a change listener
    pub fn on_change(&mut self, listener: impl FnMut(&SelectionChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener; returns false if it was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.version += 1;
            let change = SelectionChange {
                version: self.version,
                mode: self.mode,
                vertex_count: self.sets.vertices.len(),
                edge_count: self.sets.edges.len(),
                face_count: self.sets.faces.len(),
                line_count: self.sets.lines.len(),
            };
            for (_, listener) in &mut self.listeners {
                listener(&change);
            }
        }
        changed
    }
}
