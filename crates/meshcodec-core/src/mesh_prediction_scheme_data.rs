use crate::corner_table::CornerTableView;
use crate::geometry_indices::{CornerIndex, VertexIndex};
use crate::mesh_traversal_sequencer::MeshAttributeIndicesEncodingData;

/// Connectivity and encode order seen by a mesh prediction scheme.
pub struct MeshPredictionSchemeData<'a, T: CornerTableView> {
    corner_table: &'a T,
    data_to_corner_map: &'a [CornerIndex],
    vertex_to_data_map: &'a [i32],
}

impl<T: CornerTableView> Clone for MeshPredictionSchemeData<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: CornerTableView> Copy for MeshPredictionSchemeData<'_, T> {}

impl<'a, T: CornerTableView> MeshPredictionSchemeData<'a, T> {
    pub fn new(corner_table: &'a T, data_to_corner_map: &'a [CornerIndex], vertex_to_data_map: &'a [i32]) -> Self {
        Self {
            corner_table,
            data_to_corner_map,
            vertex_to_data_map,
        }
    }

    pub fn from_encoding_data(corner_table: &'a T, encoding_data: &'a MeshAttributeIndicesEncodingData) -> Self {
        Self::new(
            corner_table,
            &encoding_data.encoded_attribute_value_index_to_corner_map,
            &encoding_data.vertex_to_encoded_attribute_value_index_map,
        )
    }

    #[inline]
    pub fn corner_table(&self) -> &'a T {
        self.corner_table
    }

    #[inline]
    pub fn data_to_corner_map(&self) -> &'a [CornerIndex] {
        self.data_to_corner_map
    }

    #[inline]
    pub fn vertex_to_data_map(&self) -> &'a [i32] {
        self.vertex_to_data_map
    }

    /// Encode position of the vertex of `corner`, -1 when it has none.
    #[inline]
    pub fn data_id_of_corner(&self, corner: CornerIndex) -> i32 {
        self.data_id_of_vertex(self.corner_table.vertex(corner))
    }

    #[inline]
    pub fn data_id_of_vertex(&self, vertex: VertexIndex) -> i32 {
        if !vertex.is_valid() {
            return -1;
        }
        self.vertex_to_data_map.get(vertex.as_usize()).copied().unwrap_or(-1)
    }
}
