//! Editable mesh document
//!
//! A document is an ordered vertex list plus an ordered face list. Faces
//! reference vertices by index, and every topology edit remaps those indices
//! eagerly so no face ever points at a removed vertex.
//!
//! Adjacency is derived on demand into a [`TopologyIndex`]. The cache lives
//! inside the document and every topology-mutating method drops it through
//! a single funnel, so callers cannot read a stale index.

mod modification;
mod topology;
mod types;
mod validation;

use std::cell::OnceCell;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use modification::{MergeCluster, MergeMode, MergeOutcome, RemovalOutcome, VertexRemap};
pub use topology::TopologyIndex;
pub use types::{EdgeKey, Face, FaceId, Vertex, VertexId};

/// Mesh document: name, vertices and faces
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MeshDocument {
    name: String,
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    /// Lazily rebuilt adjacency; dropped on every topology mutation
    #[serde(skip)]
    topology: OnceCell<TopologyIndex>,
}

impl Clone for MeshDocument {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            vertices: self.vertices.clone(),
            faces: self.faces.clone(),
            topology: OnceCell::new(),
        }
    }
}

impl PartialEq for MeshDocument {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.vertices == other.vertices && self.faces == other.faces
    }
}

impl MeshDocument {
    /// Create an empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a document from positions and polygon/line index lists
    pub fn from_polygons(name: impl Into<String>, positions: &[Vec3], polygons: &[&[u32]]) -> Self {
        let mut document = Self::new(name);
        for &position in positions {
            document.add_vertex(Vertex::new(position));
        }
        for indices in polygons {
            document.add_face(Face::from_indices(indices));
        }
        document
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get vertex by ID
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    /// Get mutable vertex by ID
    ///
    /// Only attributes can change through this; topology edits go through
    /// the document's own methods.
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.index())
    }

    /// Get face by ID
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.index())
    }

    /// Get all vertices
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Get all faces
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Iterate faces with their IDs
    pub fn faces_with_ids(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, face)| (FaceId(i as u32), face))
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (polygons and lines)
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        id.index() < self.vertices.len()
    }

    pub fn position(&self, id: VertexId) -> Option<Vec3> {
        self.vertex(id).map(|v| v.position)
    }

    /// All vertex positions in index order
    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Arithmetic mean of the given vertices' positions (out-of-range ids skipped)
    pub fn centroid_of(&self, ids: impl IntoIterator<Item = VertexId>) -> Option<Vec3> {
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        for position in ids.into_iter().filter_map(|id| self.position(id)) {
            sum += position;
            count += 1;
        }
        (count > 0).then(|| sum / count as f32)
    }

    /// Centroid of a face's corners
    pub fn face_centroid(&self, id: FaceId) -> Option<Vec3> {
        let face = self.face(id)?;
        self.centroid_of(face.vertices.iter().copied())
    }

    // ========================================================================
    // Topology cache
    // ========================================================================

    /// Adjacency for the current topology, rebuilt if it was invalidated
    pub fn topology(&self) -> &TopologyIndex {
        self.topology
            .get_or_init(|| TopologyIndex::build(self.vertices.len(), &self.faces))
    }

    /// Whether the adjacency cache is currently built
    pub fn has_topology_cache(&self) -> bool {
        self.topology.get().is_some()
    }

    /// Drop the adjacency cache
    ///
    /// Every topology mutation calls this; history replay calls it too after
    /// swapping in a captured document.
    pub fn invalidate_topology(&mut self) {
        if self.topology.take().is_some() {
            tracing::trace!("topology cache invalidated for '{}'", self.name);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::*;
    use super::*;

    #[test]
    fn test_from_polygons() {
        let doc = quad();
        assert_eq!(doc.vertex_count(), 4);
        assert_eq!(doc.face_count(), 1);
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_clone_is_independent() {
        let doc = quad();
        let mut copy = doc.clone();
        copy.set_vertex_position(VertexId(0), Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(doc.position(VertexId(0)), Some(Vec3::ZERO));
        assert_ne!(doc, copy);
    }

    #[test]
    fn test_equality_ignores_topology_cache() {
        let doc = quad();
        let copy = doc.clone();
        let _ = doc.topology();
        assert!(doc.has_topology_cache());
        assert!(!copy.has_topology_cache());
        assert_eq!(doc, copy);
    }

    #[test]
    fn test_centroid() {
        let doc = quad();
        assert_eq!(doc.face_centroid(FaceId(0)), Some(Vec3::new(0.5, 0.5, 0.0)));
        assert_eq!(doc.centroid_of([VertexId(99)]), None);
    }
}
