//! Turns a traversal into an encoding order for attribute values.

use crate::corner_table::CornerTableView;
use crate::depth_first_traverser::DepthFirstTraverser;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::{AttributeValueIndex, CornerIndex, FaceIndex, PointIndex, VertexIndex};
use crate::max_prediction_degree_traverser::MaxPredictionDegreeTraverser;
use crate::mesh::Mesh;
use crate::status::{corrupt, malformed, CodecResult, Status};
use crate::traverser::{MeshTraverser, TraversalMethod, TraversalObserver};

/// Encode order of the values of one attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshAttributeIndicesEncodingData {
    /// Corner that introduced each value, in encode order.
    pub encoded_attribute_value_index_to_corner_map: Vec<CornerIndex>,
    /// Encode order position of each vertex, -1 until visited.
    pub vertex_to_encoded_attribute_value_index_map: Vec<i32>,
    pub num_values: i32,
}

impl MeshAttributeIndicesEncodingData {
    pub fn new(num_vertices: usize) -> Self {
        Self {
            encoded_attribute_value_index_to_corner_map: Vec::with_capacity(num_vertices),
            vertex_to_encoded_attribute_value_index_map: vec![-1; num_vertices],
            num_values: 0,
        }
    }
}

/// Records the point behind every newly visited vertex.
struct EncodingObserver<'m> {
    mesh: &'m Mesh,
    point_ids: Vec<PointIndex>,
    encoding_data: MeshAttributeIndicesEncodingData,
}

impl TraversalObserver for EncodingObserver<'_> {
    fn on_new_face_visited(&mut self, _face: FaceIndex) {}

    fn on_new_vertex_visited(&mut self, vertex: VertexIndex, corner: CornerIndex) {
        let point_id = self.mesh.face(FaceIndex(corner.0 / 3))[corner.as_usize() % 3];
        self.point_ids.push(point_id);
        let data = &mut self.encoding_data;
        data.encoded_attribute_value_index_to_corner_map.push(corner);
        data.vertex_to_encoded_attribute_value_index_map[vertex.as_usize()] = data.num_values;
        data.num_values += 1;
    }
}

/// Output of [`MeshTraversalSequencer::generate_sequence`].
#[derive(Debug, Clone, Default)]
pub struct PointSequence {
    /// One point per attribute value, in encode order.
    pub point_ids: Vec<PointIndex>,
    pub encoding_data: MeshAttributeIndicesEncodingData,
}

pub struct MeshTraversalSequencer<'a, T: CornerTableView> {
    mesh: &'a Mesh,
    corner_table: &'a T,
    method: TraversalMethod,
}

impl<'a, T: CornerTableView> MeshTraversalSequencer<'a, T> {
    pub fn new(mesh: &'a Mesh, corner_table: &'a T, method: TraversalMethod) -> Self {
        Self {
            mesh,
            corner_table,
            method,
        }
    }

    /// Traverses every face, seeding at corner `3f` for each face in order.
    pub fn generate_sequence(&self) -> CodecResult<PointSequence> {
        if self.mesh.num_faces() != self.corner_table.num_faces() {
            return Err(malformed(format!(
                "mesh has {} faces but the corner table has {}",
                self.mesh.num_faces(),
                self.corner_table.num_faces()
            )));
        }
        let observer = EncodingObserver {
            mesh: self.mesh,
            point_ids: Vec::with_capacity(self.corner_table.num_vertices()),
            encoding_data: MeshAttributeIndicesEncodingData::new(self.corner_table.num_vertices()),
        };
        let observer = match self.method {
            TraversalMethod::DepthFirst => run_traversal(DepthFirstTraverser::new(self.corner_table, observer))?,
            TraversalMethod::MaxPredictionDegree => {
                run_traversal(MaxPredictionDegreeTraverser::new(self.corner_table, observer))?
            }
        };
        Ok(PointSequence {
            point_ids: observer.point_ids,
            encoding_data: observer.encoding_data,
        })
    }

    /// Points every corner's point at the value its vertex received in the
    /// encode order.
    pub fn update_point_to_attribute_index_mapping(
        &self,
        attribute: &mut PointAttribute,
        encoding_data: &MeshAttributeIndicesEncodingData,
    ) -> Status {
        let num_points = self.mesh.num_points();
        attribute.set_explicit_mapping(num_points);
        for f in 0..self.mesh.num_faces() {
            let face = self.mesh.face(FaceIndex(f as u32));
            for (p, &point_id) in face.iter().enumerate() {
                let vert_id = self.corner_table.vertex(CornerIndex((3 * f + p) as u32));
                if !vert_id.is_valid() {
                    return Err(malformed(format!("corner {} has no vertex", 3 * f + p)));
                }
                let entry = encoding_data
                    .vertex_to_encoded_attribute_value_index_map
                    .get(vert_id.as_usize())
                    .copied()
                    .unwrap_or(-1);
                if entry < 0 || entry as usize >= num_points || point_id.as_usize() >= num_points {
                    return Err(corrupt(format!(
                        "attribute entry {entry} for point {} out of range ({num_points} points)",
                        point_id.0
                    )));
                }
                attribute.set_point_map_entry(point_id, AttributeValueIndex(entry as u32));
            }
        }
        Ok(())
    }
}

fn run_traversal<M: MeshTraverser>(mut traverser: M) -> CodecResult<M::Observer> {
    traverser.on_traversal_start();
    for f in 0..traverser.num_faces() {
        traverser.traverse_from_corner(CornerIndex(3 * f as u32))?;
    }
    traverser.on_traversal_end();
    Ok(traverser.into_observer())
}
