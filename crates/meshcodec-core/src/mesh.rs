use std::ops::{Deref, DerefMut};

use crate::geometry_indices::{CornerIndex, FaceIndex, PointIndex, VertexIndex, INVALID_POINT_INDEX};
use crate::point_cloud::PointCloud;

pub type Face = [PointIndex; 3];

/// Triangle mesh: a point cloud plus faces referencing its points.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    point_cloud: PointCloud,
    faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn face(&self, face_id: FaceIndex) -> Face {
        self.faces[face_id.as_usize()]
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Point referenced by a corner, `face = c / 3`, `local = c % 3`.
    pub fn corner_to_point_id(&self, corner: CornerIndex) -> PointIndex {
        if !corner.is_valid() {
            return INVALID_POINT_INDEX;
        }
        self.faces
            .get(corner.as_usize() / 3)
            .map_or(INVALID_POINT_INDEX, |face| face[corner.as_usize() % 3])
    }

    /// Face list with every point replaced by the value index it maps to in
    /// attribute `att_id`. This is the input of a corner table built on that
    /// attribute (normally the position).
    pub fn faces_mapped_through(&self, att_id: i32) -> Vec<[VertexIndex; 3]> {
        let att = self.attribute(att_id);
        self.faces
            .iter()
            .map(|face| face.map(|p| VertexIndex(att.mapped_index(p).0)))
            .collect()
    }
}

impl Deref for Mesh {
    type Target = PointCloud;

    fn deref(&self) -> &Self::Target {
        &self.point_cloud
    }
}

impl DerefMut for Mesh {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.point_cloud
    }
}
