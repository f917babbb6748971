//! Iterators over the fan of a vertex.

use crate::corner_table::CornerTableView;
use crate::geometry_indices::{CornerIndex, VertexIndex, INVALID_CORNER_INDEX};

/// Visits the vertices on the one ring of a vertex.
///
/// Starts at the left-most corner and swings left. If an open boundary is
/// hit the walk restarts at the seed and swings right, so every ring vertex
/// of an open fan is reported once.
pub struct VertexRingIterator<'a, T: CornerTableView + ?Sized> {
    table: &'a T,
    start_corner: CornerIndex,
    corner: CornerIndex,
    left_traversal: bool,
}

impl<'a, T: CornerTableView + ?Sized> VertexRingIterator<'a, T> {
    pub fn new(table: &'a T, vertex: VertexIndex) -> Self {
        let start_corner = table.left_most_corner(vertex);
        Self {
            table,
            start_corner,
            corner: start_corner,
            left_traversal: true,
        }
    }

    /// Corner currently pivoting on the center vertex.
    pub fn corner(&self) -> CornerIndex {
        self.corner
    }

    fn advance(&mut self) {
        if self.left_traversal {
            self.corner = self.table.swing_left(self.corner);
            if !self.corner.is_valid() {
                self.corner = self.start_corner;
                self.left_traversal = false;
            } else if self.corner == self.start_corner {
                self.corner = INVALID_CORNER_INDEX;
            }
        } else {
            self.corner = self.table.swing_right(self.corner);
        }
    }
}

impl<T: CornerTableView + ?Sized> Iterator for VertexRingIterator<'_, T> {
    type Item = VertexIndex;

    fn next(&mut self) -> Option<VertexIndex> {
        if !self.corner.is_valid() {
            return None;
        }
        let ring_corner = if self.left_traversal {
            self.table.previous(self.corner)
        } else {
            self.table.next(self.corner)
        };
        let vertex = self.table.vertex(ring_corner);
        self.advance();
        Some(vertex)
    }
}

/// Visits every corner around the vertex of a seed corner, left first and
/// then right of the seed when the fan is open.
pub struct VertexCornersIterator<'a, T: CornerTableView + ?Sized> {
    table: &'a T,
    start_corner: CornerIndex,
    corner: CornerIndex,
    left_traversal: bool,
}

impl<'a, T: CornerTableView + ?Sized> VertexCornersIterator<'a, T> {
    pub fn from_corner(table: &'a T, corner: CornerIndex) -> Self {
        Self {
            table,
            start_corner: corner,
            corner,
            left_traversal: true,
        }
    }

    pub fn from_vertex(table: &'a T, vertex: VertexIndex) -> Self {
        Self::from_corner(table, table.left_most_corner(vertex))
    }
}

impl<T: CornerTableView + ?Sized> Iterator for VertexCornersIterator<'_, T> {
    type Item = CornerIndex;

    fn next(&mut self) -> Option<CornerIndex> {
        if !self.corner.is_valid() {
            return None;
        }
        let current = self.corner;
        if self.left_traversal {
            self.corner = self.table.swing_left(self.corner);
            if !self.corner.is_valid() {
                self.corner = self.table.swing_right(self.start_corner);
                self.left_traversal = false;
            } else if self.corner == self.start_corner {
                self.corner = INVALID_CORNER_INDEX;
            }
        } else {
            self.corner = self.table.swing_right(self.corner);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corner_table::CornerTable;

    #[test]
    fn open_fan_corners_are_visited_once() {
        // Three triangles around vertex 0, open between 1 and 4.
        let faces: Vec<[VertexIndex; 3]> = [[0, 1, 2], [0, 2, 3], [0, 3, 4]]
            .iter()
            .map(|f| f.map(VertexIndex))
            .collect();
        let table = CornerTable::create(&faces).unwrap();
        for seed in [CornerIndex(0), CornerIndex(3), CornerIndex(6)] {
            let mut corners: Vec<u32> = VertexCornersIterator::from_corner(&table, seed).map(|c| c.0).collect();
            corners.sort_unstable();
            assert_eq!(corners, vec![0, 3, 6]);
        }
        let mut ring: Vec<u32> = VertexRingIterator::new(&table, VertexIndex(0)).map(|v| v.0).collect();
        ring.sort_unstable();
        assert_eq!(ring, vec![1, 2, 3, 4]);
    }
}
