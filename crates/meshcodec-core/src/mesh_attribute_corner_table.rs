//! Corner table view in which attribute seams behave like open boundaries.
//!
//! The base table is borrowed and never modified. Seam edges are stored as
//! per corner flags; vertices touching a seam are split into one attribute
//! vertex per seam-bounded sub-fan.

use tracing::debug;

use crate::corner_table::{CornerTable, CornerTableView};
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::{
    AttributeValueIndex, CornerIndex, FaceIndex, VertexIndex, INVALID_CORNER_INDEX, INVALID_VERTEX_INDEX,
};
use crate::mesh::Mesh;
use crate::status::{malformed, Status};

pub struct MeshAttributeCornerTable<'a> {
    corner_table: &'a CornerTable,
    is_edge_on_seam: Vec<bool>,
    is_vertex_on_seam: Vec<bool>,
    no_interior_seams: bool,
    corner_to_vertex_map: Vec<VertexIndex>,
    vertex_to_left_most_corner_map: Vec<CornerIndex>,
    vertex_to_attribute_entry_id_map: Vec<AttributeValueIndex>,
}

impl<'a> MeshAttributeCornerTable<'a> {
    /// Seam-free view. Vertices are not assigned until
    /// [`recompute_vertices`](Self::recompute_vertices) runs.
    pub fn new_empty(corner_table: &'a CornerTable) -> Self {
        Self {
            corner_table,
            is_edge_on_seam: vec![false; corner_table.num_corners()],
            is_vertex_on_seam: vec![false; corner_table.num_vertices()],
            no_interior_seams: true,
            corner_to_vertex_map: vec![INVALID_VERTEX_INDEX; corner_table.num_corners()],
            vertex_to_left_most_corner_map: Vec::with_capacity(corner_table.num_vertices()),
            vertex_to_attribute_entry_id_map: Vec::with_capacity(corner_table.num_vertices()),
        }
    }

    /// Marks every edge whose two faces map the shared vertices to different
    /// values of `attribute`, and every boundary edge, as a seam. Then splits
    /// the vertices.
    pub fn init_from_attribute(
        mesh: &Mesh,
        corner_table: &'a CornerTable,
        attribute: &PointAttribute,
    ) -> Result<Self, crate::status::CodecError> {
        let mut table = Self::new_empty(corner_table);
        let base = corner_table;
        for ci in 0..base.num_corners() {
            let c = CornerIndex(ci as u32);
            if base.is_degenerated(base.face(c)) {
                continue;
            }
            let opp = base.opposite(c);
            if !opp.is_valid() {
                table.is_edge_on_seam[ci] = true;
                table.mark_vertices_of_edge(c);
                continue;
            }
            if opp < c {
                continue;
            }
            // Compare the two corner pairs sharing a vertex across the edge.
            let mut act_c = c;
            let mut act_sibling_c = opp;
            for _ in 0..2 {
                act_c = base.next(act_c);
                act_sibling_c = base.previous(act_sibling_c);
                let value = attribute.mapped_index(mesh.corner_to_point_id(act_c));
                let sibling_value = attribute.mapped_index(mesh.corner_to_point_id(act_sibling_c));
                if value != sibling_value {
                    table.no_interior_seams = false;
                    table.is_edge_on_seam[ci] = true;
                    table.is_edge_on_seam[opp.as_usize()] = true;
                    table.mark_vertices_of_edge(c);
                    table.mark_vertices_of_edge(opp);
                    break;
                }
            }
        }
        table.recompute_vertices(Some((mesh, attribute)))?;
        debug!(
            attribute = attribute.unique_id(),
            vertices = table.num_vertices(),
            interior_seams = !table.no_interior_seams,
            "attribute corner table built"
        );
        Ok(table)
    }

    fn mark_vertices_of_edge(&mut self, c: CornerIndex) {
        let base = self.corner_table;
        self.is_vertex_on_seam[base.vertex(base.next(c)).as_usize()] = true;
        self.is_vertex_on_seam[base.vertex(base.previous(c)).as_usize()] = true;
    }

    /// Marks the edge faced by `c` (and its twin) as a seam. Vertices must be
    /// recomputed after a batch of additions.
    pub fn add_seam_edge(&mut self, c: CornerIndex) {
        self.is_edge_on_seam[c.as_usize()] = true;
        self.mark_vertices_of_edge(c);
        let opp = self.corner_table.opposite(c);
        if opp.is_valid() {
            self.no_interior_seams = false;
            self.is_edge_on_seam[opp.as_usize()] = true;
            self.mark_vertices_of_edge(opp);
        }
    }

    /// Splits every base vertex into seam-bounded sub-fans.
    ///
    /// With `Some((mesh, attribute))` each new vertex records the attribute
    /// value its corners map to; with `None` the attribute vertices are
    /// numbered consecutively.
    pub fn recompute_vertices(&mut self, source: Option<(&Mesh, &PointAttribute)>) -> Status {
        let base = self.corner_table;
        self.vertex_to_attribute_entry_id_map.clear();
        self.vertex_to_left_most_corner_map.clear();

        let entry_for = |corner: CornerIndex, new_id: u32| match source {
            Some((mesh, att)) => att.mapped_index(mesh.corner_to_point_id(corner)),
            None => AttributeValueIndex(new_id),
        };

        let mut num_new_vertices = 0u32;
        for vi in 0..base.num_vertices() {
            let v = VertexIndex(vi as u32);
            let c = base.left_most_corner(v);
            if !c.is_valid() {
                continue;
            }
            let mut first_vert_id = num_new_vertices;
            num_new_vertices += 1;
            self.vertex_to_attribute_entry_id_map.push(entry_for(c, first_vert_id));

            let mut first_c = c;
            if self.is_vertex_on_seam[vi] {
                // Find the corner that starts a seam bounded sub-fan.
                let mut act_c = self.swing_left(first_c);
                while act_c.is_valid() {
                    first_c = act_c;
                    act_c = self.swing_left(act_c);
                    if act_c == c {
                        return Err(malformed(format!(
                            "vertex {vi} is on a seam but its fan has no seam edge"
                        )));
                    }
                }
            }
            self.corner_to_vertex_map[first_c.as_usize()] = VertexIndex(first_vert_id);
            self.vertex_to_left_most_corner_map.push(first_c);

            let mut act_c = base.swing_right(first_c);
            while act_c.is_valid() && act_c != first_c {
                if self.is_corner_opposite_to_seam_edge(base.next(act_c)) {
                    first_vert_id = num_new_vertices;
                    num_new_vertices += 1;
                    self.vertex_to_attribute_entry_id_map.push(entry_for(act_c, first_vert_id));
                    self.vertex_to_left_most_corner_map.push(act_c);
                }
                self.corner_to_vertex_map[act_c.as_usize()] = VertexIndex(first_vert_id);
                act_c = base.swing_right(act_c);
            }
        }
        Ok(())
    }

    /// True when no seam runs between two faces. Boundaries do not count.
    pub fn no_interior_seams(&self) -> bool {
        self.no_interior_seams
    }

    /// True when the base vertex of `c` touches a seam.
    pub fn is_corner_on_seam(&self, c: CornerIndex) -> bool {
        let v = self.corner_table.vertex(c);
        v.is_valid() && self.is_vertex_on_seam[v.as_usize()]
    }

    /// Attribute value shared by every corner of an attribute vertex.
    pub fn vertex_to_attribute_entry_id(&self, vertex: VertexIndex) -> AttributeValueIndex {
        self.vertex_to_attribute_entry_id_map[vertex.as_usize()]
    }

    pub fn base_table(&self) -> &'a CornerTable {
        self.corner_table
    }
}

impl CornerTableView for MeshAttributeCornerTable<'_> {
    fn num_vertices(&self) -> usize {
        self.vertex_to_attribute_entry_id_map.len()
    }

    fn num_corners(&self) -> usize {
        self.corner_table.num_corners()
    }

    fn opposite(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() || self.is_corner_opposite_to_seam_edge(corner) {
            return INVALID_CORNER_INDEX;
        }
        self.corner_table.opposite(corner)
    }

    fn vertex(&self, corner: CornerIndex) -> VertexIndex {
        if !corner.is_valid() {
            return INVALID_VERTEX_INDEX;
        }
        self.corner_to_vertex_map[corner.as_usize()]
    }

    fn left_most_corner(&self, vertex: VertexIndex) -> CornerIndex {
        self.vertex_to_left_most_corner_map
            .get(vertex.as_usize())
            .copied()
            .unwrap_or(INVALID_CORNER_INDEX)
    }

    fn vertex_parent(&self, vertex: VertexIndex) -> VertexIndex {
        self.vertex_to_attribute_entry_id_map
            .get(vertex.as_usize())
            .map_or(INVALID_VERTEX_INDEX, |entry| VertexIndex(entry.0))
    }

    fn is_corner_opposite_to_seam_edge(&self, corner: CornerIndex) -> bool {
        self.is_edge_on_seam.get(corner.as_usize()).copied().unwrap_or(false)
    }

    fn is_degenerated(&self, face: FaceIndex) -> bool {
        self.corner_table.is_degenerated(face)
    }
}
