//! Type definitions for the mesh document.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{LINE_VERTICES, MIN_POLYGON_VERTICES};

/// Type-safe vertex identifier (index into the document's vertex list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Type-safe face identifier (index into the document's face list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FaceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An undirected edge stored as a sorted vertex pair.
///
/// Edges are never stored in the document; they are derived from polygon
/// faces by the topology index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(VertexId, VertexId);

impl EdgeKey {
    /// Create an edge; the endpoints are normalized to (min, max)
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    /// Smaller endpoint
    pub fn a(&self) -> VertexId {
        self.0
    }

    /// Larger endpoint
    pub fn b(&self) -> VertexId {
        self.1
    }

    pub fn vertices(&self) -> [VertexId; 2] {
        [self.0, self.1]
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.0 == vertex || self.1 == vertex
    }
}

/// A vertex position with its attribute slots
///
/// Several UV / normal slots per position let faces meeting at a seam
/// share the position while keeping their own attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            uvs: Vec::new(),
            normals: Vec::new(),
        }
    }

    pub fn with_uv(mut self, uv: Vec2) -> Self {
        self.uvs.push(uv);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normals.push(normal);
        self
    }

    /// UV stored in `slot`, if any
    pub fn uv(&self, slot: u32) -> Option<Vec2> {
        self.uvs.get(slot as usize).copied()
    }

    /// Normal stored in `slot`, if any
    pub fn normal(&self, slot: u32) -> Option<Vec3> {
        self.normals.get(slot as usize).copied()
    }
}

/// A face of the document
///
/// Two vertices make an auxiliary line entity; three or more make a polygon.
/// `uv_indices` and `normal_indices` are either empty (every corner uses its
/// vertex's slot 0) or have one entry per corner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Face {
    pub vertices: Vec<VertexId>,
    pub uv_indices: Vec<u32>,
    pub normal_indices: Vec<u32>,
    pub material_index: u32,
    pub hidden: bool,
}

impl Face {
    /// Polygon or line from plain vertex indices
    pub fn from_indices(indices: &[u32]) -> Self {
        Self {
            vertices: indices.iter().map(|&i| VertexId(i)).collect(),
            ..Default::default()
        }
    }

    /// Whether this face is a 2-vertex line entity
    pub fn is_line(&self) -> bool {
        self.vertices.len() == LINE_VERTICES
    }

    /// Whether this face is a polygon
    pub fn is_polygon(&self) -> bool {
        self.vertices.len() >= MIN_POLYGON_VERTICES
    }

    /// Distinct vertices the face needs to stay valid
    pub fn min_distinct_vertices(&self) -> usize {
        if self.is_line() {
            LINE_VERTICES
        } else {
            MIN_POLYGON_VERTICES
        }
    }

    /// Number of distinct vertex ids referenced
    pub fn distinct_vertex_count(&self) -> usize {
        let mut ids = self.vertices.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// UV slot used by a corner
    pub fn uv_slot(&self, corner: usize) -> u32 {
        self.uv_indices.get(corner).copied().unwrap_or(0)
    }

    /// Normal slot used by a corner
    pub fn normal_slot(&self, corner: usize) -> u32 {
        self.normal_indices.get(corner).copied().unwrap_or(0)
    }

    /// Whether per-corner UV indices are present and well-formed
    pub fn has_uv_indices(&self) -> bool {
        !self.uv_indices.is_empty() && self.uv_indices.len() == self.vertices.len()
    }

    /// Whether per-corner normal indices are present and well-formed
    pub fn has_normal_indices(&self) -> bool {
        !self.normal_indices.is_empty() && self.normal_indices.len() == self.vertices.len()
    }

    /// Undirected edges of a polygon face, in winding order
    ///
    /// Lines contribute no edges; they are their own entity kind.
    pub fn polygon_edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        let n = if self.is_polygon() { self.vertices.len() } else { 0 };
        (0..n).filter_map(move |i| {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            (a != b).then(|| EdgeKey::new(a, b))
        })
    }
}
