//! Structural validation for MeshDocument.

use crate::error::ValidationError;

use super::MeshDocument;
use super::types::{FaceId, VertexId};

impl MeshDocument {
    /// Check the structural invariants of the document
    ///
    /// Every face references in-range vertices, has enough distinct
    /// vertices for its kind, and carries UV/normal index lists that are
    /// either empty or one per corner.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let vertex_count = self.vertices.len();

        for (face_id, face) in self.faces_with_ids() {
            for &vertex in &face.vertices {
                if vertex.index() >= vertex_count {
                    return Err(ValidationError::FaceVertexOutOfRange {
                        face: face_id,
                        vertex,
                        vertex_count,
                    });
                }
            }

            let distinct = face.distinct_vertex_count();
            let minimum = face.min_distinct_vertices();
            if distinct < minimum {
                return Err(ValidationError::DegenerateFace {
                    face: face_id,
                    distinct,
                    minimum,
                });
            }

            check_attribute(face_id, "uv", face.vertices.len(), face.uv_indices.len())?;
            check_attribute(
                face_id,
                "normal",
                face.vertices.len(),
                face.normal_indices.len(),
            )?;
        }

        Ok(())
    }

    /// Error unless every id is in range
    pub fn check_vertices(
        &self,
        ids: impl IntoIterator<Item = VertexId>,
    ) -> Result<(), ValidationError> {
        let vertex_count = self.vertices.len();
        match ids.into_iter().find(|id| id.index() >= vertex_count) {
            Some(vertex) => Err(ValidationError::VertexOutOfRange {
                vertex,
                vertex_count,
            }),
            None => Ok(()),
        }
    }
}

fn check_attribute(
    face: FaceId,
    attribute: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ValidationError> {
    if actual == 0 || actual == expected {
        Ok(())
    } else {
        Err(ValidationError::AttributeLengthMismatch {
            face,
            attribute,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_fixtures::*;
    use super::super::types::Face;
    use super::*;

    #[test]
    fn test_valid_fixtures() {
        assert!(quad().validate().is_ok());
        assert!(two_triangles_and_line().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_face() {
        let mut doc = quad();
        doc.add_face(Face::from_indices(&[0, 1, 9]));
        assert_eq!(
            doc.validate(),
            Err(ValidationError::FaceVertexOutOfRange {
                face: FaceId(1),
                vertex: VertexId(9),
                vertex_count: 4,
            })
        );
    }

    #[test]
    fn test_degenerate_face() {
        let mut doc = quad();
        doc.add_face(Face::from_indices(&[0, 1, 1]));
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::DegenerateFace { distinct: 2, minimum: 3, .. })
        ));
    }

    #[test]
    fn test_attribute_mismatch() {
        let mut doc = quad();
        doc.add_face_indexed(&[0, 1, 2], &[0, 0], &[], 0);
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::AttributeLengthMismatch { attribute: "uv", .. })
        ));
    }

    #[test]
    fn test_check_vertices() {
        let doc = quad();
        assert!(doc.check_vertices([VertexId(0), VertexId(3)]).is_ok());
        assert!(doc.check_vertices([VertexId(4)]).is_err());
    }
}
