//! Modification methods for MeshDocument.
//!
//! Every method that changes which vertices exist or which vertices a face
//! references ends in `topology_changed()`, the single invalidation funnel
//! for the adjacency cache.

use std::collections::{BTreeMap, HashMap};

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::constants::MIN_MERGE_VERTICES;
use crate::error::ValidationError;

use super::MeshDocument;
use super::types::{EdgeKey, Face, FaceId, Vertex, VertexId};

/// How `merge_vertices` groups its input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MergeMode {
    /// Two vertices join a cluster iff their distance is <= the threshold
    /// (transitively, so chains merge)
    Threshold(f32),
    /// All given vertices collapse into one
    Forced,
}

/// Old -> new vertex index map produced by a removal
///
/// Removed vertices map to `None`; survivors shift down preserving order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexRemap {
    map: Vec<Option<VertexId>>,
}

impl VertexRemap {
    /// Map where every vertex keeps its index
    pub fn identity(vertex_count: usize) -> Self {
        Self {
            map: (0..vertex_count as u32).map(|i| Some(VertexId(i))).collect(),
        }
    }

    /// New id of an old vertex (None if removed or out of range)
    pub fn get(&self, old: VertexId) -> Option<VertexId> {
        self.map.get(old.index()).copied().flatten()
    }

    /// Remap both endpoints of an edge
    pub fn edge(&self, edge: EdgeKey) -> Option<EdgeKey> {
        Some(EdgeKey::new(self.get(edge.a())?, self.get(edge.b())?))
    }

    /// Vertex count before the removal
    pub fn old_count(&self) -> usize {
        self.map.len()
    }

    pub fn removed_count(&self) -> usize {
        self.map.iter().filter(|entry| entry.is_none()).count()
    }

    pub fn is_identity(&self) -> bool {
        self.map
            .iter()
            .enumerate()
            .all(|(i, entry)| *entry == Some(VertexId(i as u32)))
    }
}

/// Result of `remove_vertices`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemovalOutcome {
    pub remap: VertexRemap,
    pub removed_vertices: usize,
    pub removed_faces: usize,
}

/// One group of vertices collapsed into its smallest id
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCluster {
    /// Smallest member id, before the removal pass renumbers it
    pub survivor: VertexId,
    /// Sorted member ids (survivor first), pre-merge numbering
    pub members: Vec<VertexId>,
    /// Mean of the members' pre-merge positions
    pub centroid: Vec3,
}

/// Result of `merge_vertices`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    pub clusters: Vec<MergeCluster>,
    pub removal: RemovalOutcome,
}

impl MergeOutcome {
    /// Whether any vertices were collapsed
    pub fn merged_any(&self) -> bool {
        !self.clusters.is_empty()
    }

    /// Post-merge ids of the surviving vertices
    pub fn surviving_ids(&self) -> Vec<VertexId> {
        self.clusters
            .iter()
            .filter_map(|cluster| self.removal.remap.get(cluster.survivor))
            .collect()
    }
}

/// Where a merged-away vertex's corners go
struct SlotRedirect {
    target: VertexId,
    /// Source UV slot -> slot on the target
    uv_slots: Vec<u32>,
    /// Source normal slot -> slot on the target
    normal_slots: Vec<u32>,
}

impl MeshDocument {
    /// Append a vertex
    pub fn add_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(vertex);
        self.topology_changed();
        id
    }

    /// Append a vertex with no attribute slots
    pub fn add_vertex_at(&mut self, position: Vec3) -> VertexId {
        self.add_vertex(Vertex::new(position))
    }

    /// Append a face as given
    pub fn add_face(&mut self, face: Face) -> FaceId {
        let id = FaceId(self.faces.len() as u32);
        self.faces.push(face);
        self.topology_changed();
        id
    }

    /// Append a face from its parts
    ///
    /// `uv_indices` / `normal_indices` are empty or one per corner.
    pub fn add_face_indexed(
        &mut self,
        indices: &[u32],
        uv_indices: &[u32],
        normal_indices: &[u32],
        material_index: u32,
    ) -> FaceId {
        self.add_face(Face {
            vertices: indices.iter().map(|&i| VertexId(i)).collect(),
            uv_indices: uv_indices.to_vec(),
            normal_indices: normal_indices.to_vec(),
            material_index,
            hidden: false,
        })
    }

    /// Append a 2-vertex line entity
    pub fn add_line(&mut self, a: VertexId, b: VertexId) -> FaceId {
        self.add_face(Face {
            vertices: vec![a, b],
            ..Default::default()
        })
    }

    /// Set the position of a vertex; returns false for an unknown id
    pub fn set_vertex_position(&mut self, id: VertexId, position: Vec3) -> bool {
        match self.vertex_mut(id) {
            Some(v) => {
                v.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_face_hidden(&mut self, id: FaceId, hidden: bool) -> bool {
        match self.faces.get_mut(id.index()) {
            Some(face) => {
                face.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn set_face_material(&mut self, id: FaceId, material_index: u32) -> bool {
        match self.faces.get_mut(id.index()) {
            Some(face) => {
                face.material_index = material_index;
                true
            }
            None => false,
        }
    }

    /// Remove vertices and remap every face
    ///
    /// Removed corners disappear from the face (with their UV/normal
    /// entries), consecutive repeats collapse, and faces left with too few
    /// distinct vertices are dropped. Out-of-range ids are skipped.
    pub fn remove_vertices(&mut self, ids: impl IntoIterator<Item = VertexId>) -> RemovalOutcome {
        let count = self.vertices.len();
        let mut doomed = vec![false; count];
        let mut requested = 0usize;

        for id in ids {
            match doomed.get_mut(id.index()) {
                Some(flag) if !*flag => {
                    *flag = true;
                    requested += 1;
                }
                Some(_) => {}
                None => trace!("remove_vertices: skipping out-of-range {:?}", id),
            }
        }

        if requested == 0 {
            return RemovalOutcome {
                remap: VertexRemap::identity(count),
                ..Default::default()
            };
        }

        let mut next = 0u32;
        let remap = VertexRemap {
            map: doomed
                .iter()
                .map(|&gone| {
                    if gone {
                        None
                    } else {
                        let id = VertexId(next);
                        next += 1;
                        Some(id)
                    }
                })
                .collect(),
        };

        let mut index = 0;
        self.vertices.retain(|_| {
            let keep = !doomed[index];
            index += 1;
            keep
        });

        let faces_before = self.faces.len();
        self.faces = std::mem::take(&mut self.faces)
            .into_iter()
            .filter_map(|face| remap_face(face, |v| remap.get(v)))
            .collect();
        let removed_faces = faces_before - self.faces.len();

        self.topology_changed();
        debug!(
            "remove_vertices: '{}' removed {} vertices, {} faces ({} -> {} vertices)",
            self.name,
            requested,
            removed_faces,
            count,
            self.vertices.len()
        );

        RemovalOutcome {
            remap,
            removed_vertices: requested,
            removed_faces,
        }
    }

    /// Remove faces (polygons or lines); vertices are kept
    pub fn remove_faces(&mut self, ids: impl IntoIterator<Item = FaceId>) -> usize {
        let mut doomed = vec![false; self.faces.len()];
        let mut removed = 0usize;
        for id in ids {
            if let Some(flag) = doomed.get_mut(id.index()) {
                if !*flag {
                    *flag = true;
                    removed += 1;
                }
            }
        }
        if removed == 0 {
            return 0;
        }

        let mut index = 0;
        self.faces.retain(|_| {
            let keep = !doomed[index];
            index += 1;
            keep
        });
        self.topology_changed();
        debug!("remove_faces: '{}' removed {} faces", self.name, removed);
        removed
    }

    /// Collapse vertices into cluster survivors
    ///
    /// Each cluster's smallest id survives at the mean of the members'
    /// pre-merge positions. Attribute slots of merged vertices are moved onto
    /// the survivor so seams survive the merge. Faces are redirected, purged
    /// of degenerate results, and finally the merged-away vertices are
    /// removed, which renumbers everything after them.
    ///
    /// Fewer than two valid ids is a validation error and changes nothing.
    /// A threshold that groups nothing is not an error; it changes nothing.
    pub fn merge_vertices(
        &mut self,
        ids: impl IntoIterator<Item = VertexId>,
        mode: MergeMode,
    ) -> Result<MergeOutcome, ValidationError> {
        let mut candidates: Vec<VertexId> = ids
            .into_iter()
            .filter(|&id| self.contains_vertex(id))
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        if candidates.len() < MIN_MERGE_VERTICES {
            return Err(ValidationError::TooFewVertices {
                count: candidates.len(),
                minimum: MIN_MERGE_VERTICES,
            });
        }

        let mut sets = DisjointSet::new(candidates.len());
        match mode {
            MergeMode::Forced => {
                for i in 1..candidates.len() {
                    sets.union(0, i);
                }
            }
            MergeMode::Threshold(threshold) => {
                let positions: Vec<Vec3> = candidates
                    .iter()
                    .map(|id| self.vertices[id.index()].position)
                    .collect();
                if threshold > 0.0 && threshold.is_finite() {
                    unite_nearby(&positions, threshold, &mut sets);
                } else {
                    unite_all_pairs(&positions, threshold, &mut sets);
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<VertexId>> = BTreeMap::new();
        for (i, &id) in candidates.iter().enumerate() {
            groups.entry(sets.find(i)).or_default().push(id);
        }

        let clusters: Vec<MergeCluster> = groups
            .into_values()
            .filter(|members| members.len() >= MIN_MERGE_VERTICES)
            .map(|members| {
                let sum: Vec3 = members
                    .iter()
                    .map(|id| self.vertices[id.index()].position)
                    .sum();
                MergeCluster {
                    survivor: members[0],
                    centroid: sum / members.len() as f32,
                    members,
                }
            })
            .collect();

        if clusters.is_empty() {
            debug!(
                "merge_vertices: '{}' {:?} grouped none of {} candidates",
                self.name,
                mode,
                candidates.len()
            );
            return Ok(MergeOutcome {
                clusters,
                removal: RemovalOutcome {
                    remap: VertexRemap::identity(self.vertices.len()),
                    ..Default::default()
                },
            });
        }

        let mut redirects: HashMap<VertexId, SlotRedirect> = HashMap::new();
        for cluster in &clusters {
            for &member in &cluster.members[1..] {
                let redirect = self.absorb_slots(cluster.survivor, member);
                redirects.insert(member, redirect);
            }
            self.vertices[cluster.survivor.index()].position = cluster.centroid;
        }

        for face in &mut self.faces {
            redirect_face(face, &redirects);
        }

        let count = self.vertices.len();
        let faces_before = self.faces.len();
        self.faces = std::mem::take(&mut self.faces)
            .into_iter()
            .filter_map(|face| remap_face(face, |v| (v.index() < count).then_some(v)))
            .collect();
        let degenerate = faces_before - self.faces.len();
        self.topology_changed();

        let mut removal = self.remove_vertices(redirects.keys().copied());
        removal.removed_faces += degenerate;

        debug!(
            "merge_vertices: '{}' collapsed {} clusters, removed {} vertices and {} faces",
            self.name,
            clusters.len(),
            removal.removed_vertices,
            removal.removed_faces
        );

        Ok(MergeOutcome { clusters, removal })
    }

    /// Swap in a whole document, keeping nothing of the previous one
    pub(crate) fn replace_with(&mut self, other: &MeshDocument) {
        *self = other.clone();
        self.topology_changed();
    }

    /// Move `member`'s attribute slots onto `survivor`, deduplicating equal values
    fn absorb_slots(&mut self, survivor: VertexId, member: VertexId) -> SlotRedirect {
        let uvs = self.vertices[member.index()].uvs.clone();
        let normals = self.vertices[member.index()].normals.clone();
        let target = &mut self.vertices[survivor.index()];

        SlotRedirect {
            target: survivor,
            uv_slots: uvs.into_iter().map(|uv| intern(&mut target.uvs, uv)).collect(),
            normal_slots: normals
                .into_iter()
                .map(|n| intern(&mut target.normals, n))
                .collect(),
        }
    }

    /// Single invalidation funnel for topology edits
    fn topology_changed(&mut self) {
        self.invalidate_topology();
    }
}

/// Slot index of `value`, appending it if absent
fn intern<T: PartialEq + Copy>(slots: &mut Vec<T>, value: T) -> u32 {
    match slots.iter().position(|&existing| existing == value) {
        Some(i) => i as u32,
        None => {
            slots.push(value);
            (slots.len() - 1) as u32
        }
    }
}

/// Point a face's merged-away corners at their survivors, rebasing slots
fn redirect_face(face: &mut Face, redirects: &HashMap<VertexId, SlotRedirect>) {
    if !face.vertices.iter().any(|v| redirects.contains_key(v)) {
        return;
    }

    let corners = face.vertices.len();
    // Implicit slot 0 has to become explicit when it lands elsewhere on the survivor
    let mut uv_explicit = face.has_uv_indices();
    let mut normal_explicit = face.has_normal_indices();
    for v in &face.vertices {
        if let Some(redirect) = redirects.get(v) {
            uv_explicit |= redirect.uv_slots.first().is_some_and(|&slot| slot != 0);
            normal_explicit |= redirect.normal_slots.first().is_some_and(|&slot| slot != 0);
        }
    }

    if !face.has_uv_indices() {
        face.uv_indices = if uv_explicit { vec![0; corners] } else { Vec::new() };
    }
    if !face.has_normal_indices() {
        face.normal_indices = if normal_explicit {
            vec![0; corners]
        } else {
            Vec::new()
        };
    }

    for corner in 0..corners {
        let Some(redirect) = redirects.get(&face.vertices[corner]) else {
            continue;
        };
        face.vertices[corner] = redirect.target;
        if let Some(slot) = face.uv_indices.get_mut(corner) {
            *slot = redirect.uv_slots.get(*slot as usize).copied().unwrap_or(0);
        }
        if let Some(slot) = face.normal_indices.get_mut(corner) {
            *slot = redirect
                .normal_slots
                .get(*slot as usize)
                .copied()
                .unwrap_or(0);
        }
    }
}

/// Rewrite a face through `lookup`, or drop it if it degenerates
///
/// Corners mapping to `None` are removed. Consecutive repeats collapse
/// (wrapping around for polygons). The face survives only with at least
/// 3 distinct vertices (polygon) or 2 (line), judged by its original kind.
fn remap_face(face: Face, lookup: impl Fn(VertexId) -> Option<VertexId>) -> Option<Face> {
    let min_distinct = face.min_distinct_vertices();
    let closed = face.is_polygon();
    let keep_uvs = face.has_uv_indices();
    let keep_normals = face.has_normal_indices();

    let mut vertices = Vec::with_capacity(face.vertices.len());
    let mut uv_indices = Vec::new();
    let mut normal_indices = Vec::new();

    for (corner, &old) in face.vertices.iter().enumerate() {
        let Some(new) = lookup(old) else {
            continue;
        };
        if vertices.last() == Some(&new) {
            continue;
        }
        vertices.push(new);
        if keep_uvs {
            uv_indices.push(face.uv_slot(corner));
        }
        if keep_normals {
            normal_indices.push(face.normal_slot(corner));
        }
    }

    if closed {
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
            uv_indices.truncate(vertices.len());
            normal_indices.truncate(vertices.len());
        }
    }

    let remapped = Face {
        vertices,
        uv_indices,
        normal_indices,
        material_index: face.material_index,
        hidden: face.hidden,
    };
    (remapped.distinct_vertex_count() >= min_distinct).then_some(remapped)
}

/// Unite every pair within `threshold` using a grid of threshold-sized cells
///
/// Two points within the threshold lie in the same or adjacent cells, so
/// each point is only compared with the points of its 27 surrounding cells.
fn unite_nearby(positions: &[Vec3], threshold: f32, sets: &mut DisjointSet) {
    let cell_of = |p: Vec3| (p / threshold).floor().as_ivec3();
    let mut cells: HashMap<IVec3, Vec<usize>> = HashMap::new();

    for (i, &p) in positions.iter().enumerate() {
        let cell = cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(members) = cells.get(&(cell + IVec3::new(dx, dy, dz))) else {
                        continue;
                    };
                    for &j in members {
                        if p.distance(positions[j]) <= threshold {
                            sets.union(j, i);
                        }
                    }
                }
            }
        }
        cells.entry(cell).or_default().push(i);
    }
    trace!("unite_nearby: {} points in {} cells", positions.len(), cells.len());
}

/// Pairwise comparison for thresholds that cannot size a grid
fn unite_all_pairs(positions: &[Vec3], threshold: f32, sets: &mut DisjointSet) {
    for (i, &pi) in positions.iter().enumerate() {
        for (j, &pj) in positions.iter().enumerate().skip(i + 1) {
            if pi.distance(pj) <= threshold {
                sets.union(i, j);
            }
        }
    }
}

/// Union-find over candidate positions
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Keep the smaller root so representatives stay stable
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}
