//! Hit-test accelerator seam
//!
//! [`HitTestBuffers`] flattens the projected, visible entities of a document
//! into `bytemuck::Pod` arrays ready for a GPU upload. An accelerator answers
//! "nearest entity of this kind" queries over those buffers; the priority and
//! threshold rules stay in [`SelectionOperations`], so any accelerator
//! agreeing with [`CpuAccelerator`] agrees with `hit_test`.

use glam::Vec2;

use crate::document::{EdgeKey, FaceId, MeshDocument, VertexId};

use super::hit_test::{
    Projector, SelectionOperations, SubObjectHit, centroid, point_in_polygon,
    point_segment_distance, project_corners, project_vertices, visible_edges, visible_faces,
};
use super::{EntityKind, EntityRef, SelectionMode};

/// `ScreenSegment::kind` for a polygon edge
pub const SEGMENT_EDGE: u32 = 0;
/// `ScreenSegment::kind` for a line entity
pub const SEGMENT_LINE: u32 = 1;

/// A projected vertex
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ScreenVertex {
    pub position: [f32; 2],
    pub vertex: u32,
    /// Padding to 16 bytes
    pub _padding: u32,
}

/// A projected edge or line
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ScreenSegment {
    pub start: [f32; 2],
    pub end: [f32; 2],
    /// First endpoint id; the smaller one for edges, stored order for lines
    pub a: u32,
    /// Second endpoint id
    pub b: u32,
    /// Owning face for lines, `u32::MAX` for edges
    pub face: u32,
    /// `SEGMENT_EDGE` or `SEGMENT_LINE`
    pub kind: u32,
}

/// A projected polygon; its corners live in `HitTestBuffers::corners`
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ScreenFace {
    pub centroid: [f32; 2],
    pub first_corner: u32,
    pub corner_count: u32,
    pub face: u32,
    /// Padding to 32 bytes
    pub _padding: [u32; 3],
}

/// Screen-space entity buffers for one document and one projection
///
/// Entries appear in ascending id order (edges in `EdgeKey` order), which
/// is what the smallest-id tie-break relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitTestBuffers {
    pub vertices: Vec<ScreenVertex>,
    pub segments: Vec<ScreenSegment>,
    pub faces: Vec<ScreenFace>,
    pub corners: Vec<[f32; 2]>,
}

impl HitTestBuffers {
    /// Project every visible entity; unprojectable ones are left out
    pub fn build<P: Projector + ?Sized>(document: &MeshDocument, projector: &P) -> Self {
        let screen = project_vertices(document, projector);
        let mut buffers = Self::default();

        for (index, point) in screen.iter().enumerate() {
            if let Some(point) = point {
                buffers.vertices.push(ScreenVertex {
                    position: point.to_array(),
                    vertex: index as u32,
                    _padding: 0,
                });
            }
        }

        for edge in visible_edges(document) {
            if let (Some(start), Some(end)) = (screen[edge.a().index()], screen[edge.b().index()]) {
                buffers.segments.push(ScreenSegment {
                    start: start.to_array(),
                    end: end.to_array(),
                    a: edge.a().0,
                    b: edge.b().0,
                    face: u32::MAX,
                    kind: SEGMENT_EDGE,
                });
            }
        }

        for (id, corners) in visible_faces(document, true) {
            if let Some(points) = project_corners(&corners, &screen) {
                buffers.segments.push(ScreenSegment {
                    start: points[0].to_array(),
                    end: points[1].to_array(),
                    a: corners[0].0,
                    b: corners[1].0,
                    face: id.0,
                    kind: SEGMENT_LINE,
                });
            }
        }

        for (id, corners) in visible_faces(document, false) {
            if let Some(points) = project_corners(&corners, &screen) {
                buffers.faces.push(ScreenFace {
                    centroid: centroid(&points).to_array(),
                    first_corner: buffers.corners.len() as u32,
                    corner_count: points.len() as u32,
                    face: id.0,
                    _padding: [0; 3],
                });
                buffers.corners.extend(points.iter().map(|p| p.to_array()));
            }
        }

        buffers
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn segment_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.segments)
    }

    pub fn face_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.faces)
    }

    pub fn corner_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.corners)
    }

    fn face_corners(&self, face: &ScreenFace) -> Option<Vec<Vec2>> {
        let start = face.first_corner as usize;
        let end = start + face.corner_count as usize;
        self.corners
            .get(start..end)
            .map(|slice| slice.iter().copied().map(Vec2::from_array).collect())
    }
}

/// Nearest-entity queries over [`HitTestBuffers`]
pub trait HitTestAccelerator {
    /// Nearest entity of `kind` within `threshold`
    ///
    /// Faces ignore the threshold: they hit when the cursor is inside the
    /// polygon and rank by distance to the centroid. Ties go to the entry
    /// that comes first in the buffers.
    fn nearest(
        &self,
        buffers: &HitTestBuffers,
        cursor: Vec2,
        kind: EntityKind,
        threshold: f32,
    ) -> Option<SubObjectHit>;
}

/// Reference accelerator: a linear scan on the CPU
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuAccelerator;

impl HitTestAccelerator for CpuAccelerator {
    fn nearest(
        &self,
        buffers: &HitTestBuffers,
        cursor: Vec2,
        kind: EntityKind,
        threshold: f32,
    ) -> Option<SubObjectHit> {
        let candidates: Vec<(EntityRef, f32)> = match kind {
            EntityKind::Vertex => buffers
                .vertices
                .iter()
                .map(|v| {
                    let distance = cursor.distance(Vec2::from_array(v.position));
                    (EntityRef::Vertex(VertexId(v.vertex)), distance)
                })
                .collect(),
            EntityKind::Edge | EntityKind::Line => {
                let wanted = if kind == EntityKind::Edge {
                    SEGMENT_EDGE
                } else {
                    SEGMENT_LINE
                };
                buffers
                    .segments
                    .iter()
                    .filter(|s| s.kind == wanted)
                    .map(|s| {
                        let distance = point_segment_distance(
                            cursor,
                            Vec2::from_array(s.start),
                            Vec2::from_array(s.end),
                        );
                        let entity = if s.kind == SEGMENT_EDGE {
                            EntityRef::Edge(EdgeKey::new(VertexId(s.a), VertexId(s.b)))
                        } else {
                            EntityRef::Line(FaceId(s.face))
                        };
                        (entity, distance)
                    })
                    .collect()
            }
            EntityKind::Face => buffers
                .faces
                .iter()
                .filter_map(|f| {
                    let polygon = buffers.face_corners(f)?;
                    point_in_polygon(cursor, &polygon).then(|| {
                        let distance = cursor.distance(Vec2::from_array(f.centroid));
                        (EntityRef::Face(FaceId(f.face)), distance)
                    })
                })
                .collect(),
        };

        let mut best: Option<SubObjectHit> = None;
        for (entity, distance) in candidates {
            if distance <= threshold && best.is_none_or(|b| distance < b.screen_distance) {
                best = Some(SubObjectHit {
                    entity,
                    screen_distance: distance,
                });
            }
        }
        best
    }
}

impl SelectionOperations {
    /// `hit_test` answered by an accelerator over prebuilt buffers
    pub fn hit_test_accelerated(
        &self,
        cursor: Vec2,
        buffers: &HitTestBuffers,
        mode: SelectionMode,
        accelerator: &dyn HitTestAccelerator,
    ) -> Option<SubObjectHit> {
        mode.sanitized()
            .kinds()
            .find_map(|kind| accelerator.nearest(buffers, cursor, kind, self.threshold(kind)))
    }
}
