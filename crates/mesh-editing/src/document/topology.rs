//! Derived adjacency for a mesh document.

use std::collections::BTreeSet;

use tracing::trace;

use super::types::{EdgeKey, Face, FaceId, VertexId};

/// Vertex/face/edge adjacency built from a face list
///
/// Every face (polygons and lines) registers as incident to its vertices.
/// Edges come from polygon faces only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyIndex {
    vertex_faces: Vec<Vec<FaceId>>,
    vertex_edges: Vec<Vec<EdgeKey>>,
    face_edges: Vec<Vec<EdgeKey>>,
    /// Distinct in-range vertices of each face, in winding order
    face_vertices: Vec<Vec<VertexId>>,
    /// Sorted, unique
    edges: Vec<EdgeKey>,
}

impl TopologyIndex {
    /// Build the index in O(V + F)
    ///
    /// References to vertices outside `vertex_count` are skipped.
    pub fn build(vertex_count: usize, faces: &[Face]) -> Self {
        let mut vertex_faces: Vec<Vec<FaceId>> = vec![Vec::new(); vertex_count];
        let mut vertex_edges: Vec<Vec<EdgeKey>> = vec![Vec::new(); vertex_count];
        let mut face_edges: Vec<Vec<EdgeKey>> = Vec::with_capacity(faces.len());
        let mut face_vertices: Vec<Vec<VertexId>> = Vec::with_capacity(faces.len());
        let mut edges: BTreeSet<EdgeKey> = BTreeSet::new();

        for (face_index, face) in faces.iter().enumerate() {
            let face_id = FaceId(face_index as u32);
            let mut own_vertices = Vec::with_capacity(face.vertices.len());

            for &vertex in &face.vertices {
                let Some(incident) = vertex_faces.get_mut(vertex.index()) else {
                    trace!("topology: face {:?} references missing {:?}", face_id, vertex);
                    continue;
                };
                // Faces are visited in order, so a repeat can only be the last entry
                if incident.last() != Some(&face_id) {
                    incident.push(face_id);
                }
                if !own_vertices.contains(&vertex) {
                    own_vertices.push(vertex);
                }
            }
            face_vertices.push(own_vertices);

            let mut own_edges = Vec::new();
            for edge in face.polygon_edges() {
                if edge.b().index() >= vertex_count {
                    continue;
                }
                if !own_edges.contains(&edge) {
                    own_edges.push(edge);
                }
                if edges.insert(edge) {
                    vertex_edges[edge.a().index()].push(edge);
                    vertex_edges[edge.b().index()].push(edge);
                }
            }
            face_edges.push(own_edges);
        }

        let index = Self {
            vertex_faces,
            vertex_edges,
            face_edges,
            face_vertices,
            edges: edges.into_iter().collect(),
        };
        trace!(
            "topology: rebuilt {} vertices, {} faces, {} edges",
            vertex_count,
            faces.len(),
            index.edges.len()
        );
        index
    }

    /// Faces (polygons and lines) using a vertex
    pub fn faces_of_vertex(&self, vertex: VertexId) -> &[FaceId] {
        self.vertex_faces
            .get(vertex.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Polygon edges touching a vertex
    pub fn edges_of_vertex(&self, vertex: VertexId) -> &[EdgeKey] {
        self.vertex_edges
            .get(vertex.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges bounding a polygon face (empty for lines)
    pub fn edges_of_face(&self, face: FaceId) -> &[EdgeKey] {
        self.face_edges
            .get(face.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct vertices of a face (polygon or line)
    pub fn vertices_of_face(&self, face: FaceId) -> &[VertexId] {
        self.face_vertices
            .get(face.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Union of the vertices of several faces
    pub fn vertices_of_faces(&self, faces: impl IntoIterator<Item = FaceId>) -> BTreeSet<VertexId> {
        faces
            .into_iter()
            .flat_map(|face| self.vertices_of_face(face).iter().copied())
            .collect()
    }

    /// All unique edges, sorted
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Number of unique edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_edge(&self, edge: EdgeKey) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    /// Polygon faces bordering an edge
    pub fn faces_of_edge(&self, edge: EdgeKey) -> Vec<FaceId> {
        self.faces_of_vertex(edge.a())
            .iter()
            .copied()
            .filter(|&face| self.edges_of_face(face).contains(&edge))
            .collect()
    }

    /// An edge with fewer than two bordering faces
    pub fn is_boundary_edge(&self, edge: EdgeKey) -> bool {
        self.contains_edge(edge) && self.faces_of_edge(edge).len() < 2
    }

    /// Vertices connected to `vertex` by a polygon edge
    pub fn adjacent_vertices(&self, vertex: VertexId) -> Vec<VertexId> {
        self.edges_of_vertex(vertex)
            .iter()
            .map(|edge| if edge.a() == vertex { edge.b() } else { edge.a() })
            .collect()
    }
}
