//! Corner table connectivity.
//!
//! Every face owns three consecutive corners (`3f`, `3f + 1`, `3f + 2`).
//! A corner maps to the vertex it sits on and to the corner across the
//! edge it faces. Everything else (swings, left/right neighbours, vertex
//! fans) is derived from those two arrays.

use tracing::{debug, trace, warn};

use crate::corner_table_iterators::VertexRingIterator;
use crate::geometry_indices::{
    CornerIndex, FaceIndex, VertexIndex, INVALID_CORNER_INDEX, INVALID_FACE_INDEX, INVALID_VERTEX_INDEX,
};
use crate::status::{malformed, Status};

/// Read-only adjacency queries shared by [`CornerTable`] and
/// [`MeshAttributeCornerTable`](crate::mesh_attribute_corner_table::MeshAttributeCornerTable).
///
/// Traversers, the sequencer and the prediction schemes only need this
/// interface, so they run unchanged on seam-split connectivity.
pub trait CornerTableView {
    fn num_vertices(&self) -> usize;
    fn num_corners(&self) -> usize;
    fn opposite(&self, corner: CornerIndex) -> CornerIndex;
    fn vertex(&self, corner: CornerIndex) -> VertexIndex;
    fn left_most_corner(&self, vertex: VertexIndex) -> CornerIndex;

    /// Vertex of the base table that `vertex` was split from.
    fn vertex_parent(&self, vertex: VertexIndex) -> VertexIndex;

    /// True when the edge faced by `corner` is an attribute seam. Never true
    /// on plain connectivity.
    fn is_corner_opposite_to_seam_edge(&self, _corner: CornerIndex) -> bool {
        false
    }

    #[inline]
    fn num_faces(&self) -> usize {
        self.num_corners() / 3
    }

    #[inline]
    fn next(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return corner;
        }
        if (corner.0 + 1) % 3 == 0 {
            CornerIndex(corner.0 - 2)
        } else {
            CornerIndex(corner.0 + 1)
        }
    }

    #[inline]
    fn previous(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return corner;
        }
        if corner.0 % 3 == 0 {
            CornerIndex(corner.0 + 2)
        } else {
            CornerIndex(corner.0 - 1)
        }
    }

    #[inline]
    fn face(&self, corner: CornerIndex) -> FaceIndex {
        if !corner.is_valid() {
            return INVALID_FACE_INDEX;
        }
        FaceIndex(corner.0 / 3)
    }

    #[inline]
    fn first_corner(&self, face: FaceIndex) -> CornerIndex {
        if !face.is_valid() {
            return INVALID_CORNER_INDEX;
        }
        CornerIndex(face.0 * 3)
    }

    fn all_corners(&self, face: FaceIndex) -> [CornerIndex; 3] {
        let c = face.0 * 3;
        [CornerIndex(c), CornerIndex(c + 1), CornerIndex(c + 2)]
    }

    /// Next corner around the vertex of `corner`, moving right.
    #[inline]
    fn swing_right(&self, corner: CornerIndex) -> CornerIndex {
        self.previous(self.opposite(self.previous(corner)))
    }

    /// Next corner around the vertex of `corner`, moving left.
    #[inline]
    fn swing_left(&self, corner: CornerIndex) -> CornerIndex {
        self.next(self.opposite(self.next(corner)))
    }

    #[inline]
    fn get_left_corner(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return INVALID_CORNER_INDEX;
        }
        self.opposite(self.previous(corner))
    }

    #[inline]
    fn get_right_corner(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return INVALID_CORNER_INDEX;
        }
        self.opposite(self.next(corner))
    }

    fn is_on_boundary(&self, vertex: VertexIndex) -> bool {
        let corner = self.left_most_corner(vertex);
        !self.swing_left(corner).is_valid()
    }

    fn is_degenerated(&self, face: FaceIndex) -> bool {
        if !face.is_valid() {
            return true;
        }
        let [c0, c1, c2] = self.all_corners(face);
        let (v0, v1, v2) = (self.vertex(c0), self.vertex(c1), self.vertex(c2));
        v0 == v1 || v0 == v2 || v1 == v2
    }

    /// Number of distinct ring vertices around `vertex`. A boundary fan of
    /// `k` triangles has valence `k + 1`. Returns -1 for the invalid vertex.
    fn valence(&self, vertex: VertexIndex) -> i32 {
        if !vertex.is_valid() {
            return -1;
        }
        VertexRingIterator::new(self, vertex).count() as i32
    }
}

/// Memoized valences. Both arrays are empty until filled and are dropped
/// by every mutation of the owning table.
#[derive(Debug, Default, Clone)]
struct ValenceCache {
    clipped: Vec<i8>,
    exact: Vec<i32>,
}

/// Connectivity of a triangle mesh.
#[derive(Debug, Default, Clone)]
pub struct CornerTable {
    corner_to_vertex_map: Vec<VertexIndex>,
    opposite_corners: Vec<CornerIndex>,
    vertex_corners: Vec<CornerIndex>,
    num_original_vertices: usize,
    num_degenerated_faces: usize,
    num_isolated_vertices: usize,
    non_manifold_vertex_parents: Vec<VertexIndex>,
    valence_cache: ValenceCache,
}

impl CornerTableView for CornerTable {
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_corners.len()
    }

    #[inline]
    fn num_corners(&self) -> usize {
        self.corner_to_vertex_map.len()
    }

    #[inline]
    fn opposite(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return corner;
        }
        self.opposite_corners[corner.as_usize()]
    }

    #[inline]
    fn vertex(&self, corner: CornerIndex) -> VertexIndex {
        if !corner.is_valid() {
            return INVALID_VERTEX_INDEX;
        }
        self.corner_to_vertex_map[corner.as_usize()]
    }

    #[inline]
    fn left_most_corner(&self, vertex: VertexIndex) -> CornerIndex {
        self.vertex_corners
            .get(vertex.as_usize())
            .copied()
            .unwrap_or(INVALID_CORNER_INDEX)
    }

    fn vertex_parent(&self, vertex: VertexIndex) -> VertexIndex {
        if vertex.as_usize() < self.num_original_vertices {
            return vertex;
        }
        self.non_manifold_vertex_parents
            .get(vertex.as_usize() - self.num_original_vertices)
            .copied()
            .unwrap_or(INVALID_VERTEX_INDEX)
    }
}

/// Half edge waiting for its twin: the vertex it points to and the corner
/// facing it.
#[derive(Debug, Clone, Copy)]
struct VertexEdgePair {
    sink_vert: VertexIndex,
    edge_corner: CornerIndex,
}

impl CornerTable {
    /// Table with `num_faces` faces whose corners are all unmapped.
    pub fn new(num_faces: usize) -> Self {
        Self {
            corner_to_vertex_map: vec![INVALID_VERTEX_INDEX; num_faces * 3],
            opposite_corners: vec![INVALID_CORNER_INDEX; num_faces * 3],
            ..Self::default()
        }
    }

    /// Builds the table for a face list.
    pub fn create(faces: &[[VertexIndex; 3]]) -> Result<Self, crate::status::CodecError> {
        let mut table = Self::default();
        table.init(faces)?;
        Ok(table)
    }

    /// Rebuilds the table from a face list.
    ///
    /// Runs opposite matching, then breaks non-manifold edges, then assigns
    /// left-most corners, splitting vertices whose corners form several
    /// disjoint fans.
    pub fn init(&mut self, faces: &[[VertexIndex; 3]]) -> Status {
        if let Some(f) = faces.iter().position(|face| face.iter().any(|v| !v.is_valid())) {
            return Err(malformed(format!("face {f} references an invalid vertex")));
        }
        self.corner_to_vertex_map = faces.iter().flatten().copied().collect();
        self.opposite_corners = vec![INVALID_CORNER_INDEX; self.corner_to_vertex_map.len()];
        self.vertex_corners.clear();
        self.non_manifold_vertex_parents.clear();
        self.num_degenerated_faces = 0;
        self.clear_valence_cache();

        let num_vertices = self.compute_opposite_corners();
        self.break_non_manifold_edges();
        self.compute_vertex_corners(num_vertices);

        debug!(
            faces = self.num_faces(),
            vertices = self.num_vertices(),
            new_vertices = self.num_new_vertices(),
            degenerated_faces = self.num_degenerated_faces,
            isolated_vertices = self.num_isolated_vertices,
            "corner table built"
        );
        if self.num_new_vertices() > 0 {
            warn!(
                "split {} non-manifold vertices into separate fans",
                self.num_new_vertices()
            );
        }
        Ok(())
    }

    /// Vertices present in the input face list.
    pub fn num_original_vertices(&self) -> usize {
        self.num_original_vertices
    }

    /// Vertices created while splitting non-manifold fans.
    pub fn num_new_vertices(&self) -> usize {
        self.num_vertices() - self.num_original_vertices
    }

    pub fn num_degenerated_faces(&self) -> usize {
        self.num_degenerated_faces
    }

    pub fn num_isolated_vertices(&self) -> usize {
        self.num_isolated_vertices
    }

    // Mutation primitives. All of them drop the valence cache.

    pub fn add_new_vertex(&mut self) -> VertexIndex {
        self.clear_valence_cache();
        self.vertex_corners.push(INVALID_CORNER_INDEX);
        VertexIndex((self.vertex_corners.len() - 1) as u32)
    }

    pub fn set_opposite_corner(&mut self, corner: CornerIndex, opposite: CornerIndex) {
        self.clear_valence_cache();
        self.opposite_corners[corner.as_usize()] = opposite;
    }

    /// Links two corners as each other's opposite.
    pub fn set_opposite_corners(&mut self, c0: CornerIndex, c1: CornerIndex) {
        self.clear_valence_cache();
        if c0.is_valid() {
            self.opposite_corners[c0.as_usize()] = c1;
        }
        if c1.is_valid() {
            self.opposite_corners[c1.as_usize()] = c0;
        }
    }

    pub fn map_corner_to_vertex(&mut self, corner: CornerIndex, vertex: VertexIndex) {
        self.clear_valence_cache();
        self.corner_to_vertex_map[corner.as_usize()] = vertex;
    }

    pub fn make_vertex_isolated(&mut self, vertex: VertexIndex) {
        self.clear_valence_cache();
        if let Some(slot) = self.vertex_corners.get_mut(vertex.as_usize()) {
            *slot = INVALID_CORNER_INDEX;
        }
    }

    pub fn set_left_most_corner(&mut self, vertex: VertexIndex, corner: CornerIndex) {
        if let Some(slot) = self.vertex_corners.get_mut(vertex.as_usize()) {
            *slot = corner;
        }
    }

    /// Moves the stored corner of `vertex` to the left end of its fan.
    pub fn update_vertex_to_corner_map(&mut self, vertex: VertexIndex) {
        let first_c = self.left_most_corner(vertex);
        if !first_c.is_valid() {
            return;
        }
        let mut c = first_c;
        let mut act_c = self.swing_left(first_c);
        while act_c.is_valid() && act_c != first_c {
            c = act_c;
            act_c = self.swing_left(act_c);
        }
        if act_c != first_c {
            self.vertex_corners[vertex.as_usize()] = c;
        }
    }

    /// Fills both valence caches.
    pub fn cache_valences(&mut self) {
        let exact: Vec<i32> = (0..self.num_vertices())
            .map(|v| self.valence(VertexIndex(v as u32)))
            .collect();
        self.valence_cache.clipped = exact.iter().map(|&v| v.min(i8::MAX as i32) as i8).collect();
        self.valence_cache.exact = exact;
    }

    /// Valence clipped to `i8::MAX`. Computed on the fly while the cache is empty.
    pub fn valence_from_cache_clipped(&self, vertex: VertexIndex) -> i8 {
        match self.valence_cache.clipped.get(vertex.as_usize()) {
            Some(&v) => v,
            None => self.valence(vertex).min(i8::MAX as i32) as i8,
        }
    }

    pub fn valence_from_cache(&self, vertex: VertexIndex) -> i32 {
        match self.valence_cache.exact.get(vertex.as_usize()) {
            Some(&v) => v,
            None => self.valence(vertex),
        }
    }

    pub fn has_cached_valences(&self) -> bool {
        !self.valence_cache.exact.is_empty()
    }

    pub fn clear_valence_cache(&mut self) {
        self.valence_cache.clipped.clear();
        self.valence_cache.exact.clear();
    }

    /// Matches every half edge with its twin and returns the number of
    /// vertices referenced by the face list. Degenerate faces and mirrored
    /// faces are never linked.
    fn compute_opposite_corners(&mut self) -> usize {
        let num_corners = self.num_corners();

        let mut num_corners_on_vertices: Vec<usize> = Vec::new();
        for &v in &self.corner_to_vertex_map {
            if v.as_usize() >= num_corners_on_vertices.len() {
                num_corners_on_vertices.resize(v.as_usize() + 1, 0);
            }
            num_corners_on_vertices[v.as_usize()] += 1;
        }

        // Half edges starting at vertex v live in
        // vertex_edges[vertex_offset[v]..vertex_offset[v] + num_edges[v]].
        let mut vertex_offset = Vec::with_capacity(num_corners_on_vertices.len());
        let mut offset = 0;
        for &count in &num_corners_on_vertices {
            vertex_offset.push(offset);
            offset += count;
        }
        let mut num_edges = vec![0usize; num_corners_on_vertices.len()];
        let mut vertex_edges = vec![
            VertexEdgePair {
                sink_vert: INVALID_VERTEX_INDEX,
                edge_corner: INVALID_CORNER_INDEX,
            };
            num_corners
        ];

        let mut c = 0;
        while c < num_corners {
            let corner = CornerIndex(c as u32);
            let tip_v = self.vertex(corner);
            let source_v = self.vertex(self.next(corner));
            let sink_v = self.vertex(self.previous(corner));

            if c % 3 == 0 && (tip_v == source_v || tip_v == sink_v || source_v == sink_v) {
                self.num_degenerated_faces += 1;
                c += 3;
                continue;
            }

            // Look for the twin half edge sink_v -> source_v.
            let start = vertex_offset[sink_v.as_usize()];
            let len = num_edges[sink_v.as_usize()];
            let twin = vertex_edges[start..start + len].iter().position(|e| {
                e.sink_vert == source_v && self.vertex(e.edge_corner) != tip_v
            });

            match twin {
                Some(i) => {
                    let opposite_c = vertex_edges[start + i].edge_corner;
                    // Shift rather than swap: later twins on this vertex must
                    // keep their insertion order to pair the same way.
                    vertex_edges.copy_within(start + i + 1..start + len, start + i);
                    num_edges[sink_v.as_usize()] -= 1;
                    self.opposite_corners[c] = opposite_c;
                    self.opposite_corners[opposite_c.as_usize()] = corner;
                }
                None => {
                    let slot = vertex_offset[source_v.as_usize()] + num_edges[source_v.as_usize()];
                    vertex_edges[slot] = VertexEdgePair {
                        sink_vert: sink_v,
                        edge_corner: corner,
                    };
                    num_edges[source_v.as_usize()] += 1;
                }
            }
            c += 1;
        }
        num_corners_on_vertices.len()
    }

    /// Disconnects edges that a vertex fan passes more than once, e.g. a
    /// ring `|1, 2, 3, 1, 4|` around a pivot crosses edge `<pivot, 1>` twice.
    /// The resulting open fans become separate vertices later on.
    fn break_non_manifold_edges(&mut self) {
        let mut visited_corners = vec![false; self.num_corners()];
        let mut sink_vertices: Vec<(VertexIndex, CornerIndex)> = Vec::new();
        loop {
            let mut mesh_connectivity_updated = false;
            for c in 0..self.num_corners() {
                if visited_corners[c] {
                    continue;
                }
                sink_vertices.clear();

                let mut first_c = CornerIndex(c as u32);
                let mut current_c = first_c;
                loop {
                    let next_c = self.swing_left(current_c);
                    if next_c == first_c || !next_c.is_valid() || visited_corners[next_c.as_usize()] {
                        break;
                    }
                    current_c = next_c;
                }
                first_c = current_c;

                loop {
                    visited_corners[current_c.as_usize()] = true;
                    // Every edge of the fan is identified by its sink vertex.
                    let sink_c = self.next(current_c);
                    let sink_v = self.vertex(sink_c);
                    let edge_corner = self.previous(current_c);

                    let mut vertex_connectivity_updated = false;
                    for &(attached_v, other_edge_corner) in &sink_vertices {
                        if attached_v != sink_v {
                            continue;
                        }
                        let opp_edge_corner = self.opposite(edge_corner);
                        if opp_edge_corner == other_edge_corner {
                            // Closing the loop.
                            continue;
                        }
                        let opp_other_edge_corner = self.opposite(other_edge_corner);
                        for corner in [opp_edge_corner, opp_other_edge_corner, edge_corner, other_edge_corner] {
                            if corner.is_valid() {
                                self.opposite_corners[corner.as_usize()] = INVALID_CORNER_INDEX;
                            }
                        }
                        trace!(corner = edge_corner.0, "broke non-manifold edge");
                        vertex_connectivity_updated = true;
                        break;
                    }
                    if vertex_connectivity_updated {
                        // The fan changed shape; revisit it on the next sweep.
                        mesh_connectivity_updated = true;
                        break;
                    }

                    sink_vertices.push((self.vertex(self.previous(current_c)), sink_c));

                    current_c = self.swing_right(current_c);
                    if current_c == first_c || !current_c.is_valid() {
                        break;
                    }
                }
            }
            if !mesh_connectivity_updated {
                break;
            }
        }
    }

    /// Stores the left-most corner of every vertex and creates a new vertex
    /// for each extra fan found on an already visited vertex.
    fn compute_vertex_corners(&mut self, num_vertices: usize) {
        self.num_original_vertices = num_vertices;
        self.vertex_corners = vec![INVALID_CORNER_INDEX; num_vertices];

        let mut visited_vertices = vec![false; num_vertices];
        let mut visited_corners = vec![false; self.num_corners()];

        for f in 0..self.num_faces() {
            let face = FaceIndex(f as u32);
            if self.is_degenerated(face) {
                continue;
            }
            for c in self.all_corners(face) {
                if visited_corners[c.as_usize()] {
                    continue;
                }
                let mut v = self.vertex(c);
                let mut is_non_manifold_vertex = false;
                if visited_vertices[v.as_usize()] {
                    // A second fan on a visited vertex.
                    self.non_manifold_vertex_parents.push(v);
                    v = self.add_new_vertex();
                    visited_vertices.push(false);
                    is_non_manifold_vertex = true;
                }
                visited_vertices[v.as_usize()] = true;

                let mut act_c = c;
                while act_c.is_valid() {
                    visited_corners[act_c.as_usize()] = true;
                    self.vertex_corners[v.as_usize()] = act_c;
                    if is_non_manifold_vertex {
                        self.corner_to_vertex_map[act_c.as_usize()] = v;
                    }
                    act_c = self.swing_left(act_c);
                    if act_c == c {
                        break;
                    }
                }
                if !act_c.is_valid() {
                    // Open fan: cover the part to the right of the seed.
                    act_c = self.swing_right(c);
                    while act_c.is_valid() {
                        visited_corners[act_c.as_usize()] = true;
                        if is_non_manifold_vertex {
                            self.corner_to_vertex_map[act_c.as_usize()] = v;
                        }
                        act_c = self.swing_right(act_c);
                    }
                }
            }
        }
        self.num_isolated_vertices = visited_vertices.iter().filter(|&&visited| !visited).count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces(list: &[[u32; 3]]) -> Vec<[VertexIndex; 3]> {
        list.iter().map(|f| f.map(VertexIndex)).collect()
    }

    #[test]
    fn single_triangle_is_all_boundary() {
        let table = CornerTable::create(&faces(&[[0, 1, 2]])).unwrap();
        assert_eq!(table.num_vertices(), 3);
        for c in 0..3 {
            assert!(!table.opposite(CornerIndex(c)).is_valid());
        }
        for v in 0..3 {
            assert!(table.is_on_boundary(VertexIndex(v)));
            assert_eq!(table.valence(VertexIndex(v)), 2);
        }
    }

    #[test]
    fn quad_shares_one_edge() {
        let table = CornerTable::create(&faces(&[[0, 1, 2], [2, 1, 3]])).unwrap();
        // Corner 0 faces edge 1-2, corner 5 faces edge 2-1.
        assert_eq!(table.opposite(CornerIndex(0)), CornerIndex(5));
        assert_eq!(table.opposite(CornerIndex(5)), CornerIndex(0));
        assert_eq!(table.valence(VertexIndex(1)), 3);
        assert_eq!(table.valence(VertexIndex(0)), 2);
    }

    #[test]
    fn degenerate_face_is_counted_and_unlinked() {
        let table = CornerTable::create(&faces(&[[0, 1, 2], [2, 1, 1]])).unwrap();
        assert_eq!(table.num_degenerated_faces(), 1);
        assert!(table.is_degenerated(FaceIndex(1)));
        for c in 0..6 {
            assert!(!table.opposite(CornerIndex(c)).is_valid());
        }
    }

    #[test]
    fn invalid_vertex_is_rejected() {
        let err = CornerTable::create(&[[VertexIndex(0), VertexIndex(1), INVALID_VERTEX_INDEX]]).unwrap_err();
        assert!(matches!(err, crate::status::CodecError::MalformedConnectivity(_)));
    }

    #[test]
    fn valence_cache_is_dropped_on_mutation() {
        let mut table = CornerTable::create(&faces(&[[0, 1, 2], [2, 1, 3]])).unwrap();
        table.cache_valences();
        assert!(table.has_cached_valences());
        assert_eq!(table.valence_from_cache(VertexIndex(2)), 3);
        assert_eq!(table.valence_from_cache_clipped(VertexIndex(3)), 2);
        let v = table.add_new_vertex();
        assert!(!table.has_cached_valences());
        assert_eq!(table.valence_from_cache(v), 0);
    }

    #[test]
    fn hand_built_table_matches_created_one() {
        // Two triangles sharing edge 1-2, wired corner by corner.
        let mut table = CornerTable::new(2);
        for (c, v) in [0, 1, 2, 2, 1, 3].into_iter().enumerate() {
            table.map_corner_to_vertex(CornerIndex(c as u32), VertexIndex(v));
        }
        for _ in 0..4 {
            table.add_new_vertex();
        }
        table.set_opposite_corners(CornerIndex(0), CornerIndex(5));
        for (v, c) in [(0, 0), (1, 4), (2, 2), (3, 5)] {
            table.set_left_most_corner(VertexIndex(v), CornerIndex(c));
        }
        // Vertices 1 and 2 start from their right-most corners.
        table.update_vertex_to_corner_map(VertexIndex(1));
        table.update_vertex_to_corner_map(VertexIndex(2));

        let created = CornerTable::create(&faces(&[[0, 1, 2], [2, 1, 3]])).unwrap();
        for v in 0..4 {
            let v = VertexIndex(v);
            assert_eq!(table.left_most_corner(v), created.left_most_corner(v), "{v:?}");
            assert_eq!(table.valence(v), created.valence(v));
        }

        table.set_opposite_corner(CornerIndex(5), INVALID_CORNER_INDEX);
        assert_eq!(table.opposite(CornerIndex(0)), CornerIndex(5));
        assert!(!table.opposite(CornerIndex(5)).is_valid());

        table.make_vertex_isolated(VertexIndex(3));
        assert!(!table.left_most_corner(VertexIndex(3)).is_valid());
        assert_eq!(table.valence(VertexIndex(3)), 0);
    }
}
