use crate::corner_table::CornerTableView;
use crate::geometry_indices::{CornerIndex, VertexIndex};
use crate::status::{malformed, Status};
use crate::traverser::{MeshTraverser, TraversalObserver, TraverserBase};

/// Stack based traversal in the edgebreaker order.
///
/// From each face the walk continues into the right neighbour when the tip
/// vertex is new and interior. Otherwise it goes into the single unvisited
/// neighbour, or splits: the left corner stays on the stack and the right
/// one is processed first.
pub struct DepthFirstTraverser<'a, T: CornerTableView, O: TraversalObserver> {
    base: TraverserBase<'a, T, O>,
    corner_traversal_stack: Vec<CornerIndex>,
}

fn checked_vertex<T: CornerTableView>(table: &T, corner: CornerIndex) -> Result<VertexIndex, crate::status::CodecError> {
    let v = table.vertex(corner);
    if !v.is_valid() || v.as_usize() >= table.num_vertices() {
        return Err(malformed(format!("corner {} has no valid vertex", corner.0)));
    }
    Ok(v)
}

impl<'a, T: CornerTableView, O: TraversalObserver> DepthFirstTraverser<'a, T, O> {
    pub fn new(corner_table: &'a T, observer: O) -> Self {
        Self {
            base: TraverserBase::new(corner_table, observer),
            corner_traversal_stack: Vec::new(),
        }
    }
}

impl<T: CornerTableView, O: TraversalObserver> MeshTraverser for DepthFirstTraverser<'_, T, O> {
    type Observer = O;

    fn num_faces(&self) -> usize {
        self.base.corner_table().num_faces()
    }

    fn traverse_from_corner(&mut self, start: CornerIndex) -> Status {
        if self.base.is_corner_face_visited(start) {
            return Ok(());
        }
        let table = self.base.corner_table();
        self.corner_traversal_stack.clear();
        self.corner_traversal_stack.push(start);

        // The first face reaches its other two vertices without an edge walk.
        let next_c = table.next(start);
        let prev_c = table.previous(start);
        let next_vert = checked_vertex(table, next_c)?;
        let prev_vert = checked_vertex(table, prev_c)?;
        self.base.visit_vertex(next_vert, next_c);
        self.base.visit_vertex(prev_vert, prev_c);

        while let Some(&top) = self.corner_traversal_stack.last() {
            if self.base.is_corner_face_visited(top) {
                self.corner_traversal_stack.pop();
                continue;
            }
            let mut corner_id = top;
            loop {
                self.base.visit_face(table.face(corner_id));

                let vert_id = checked_vertex(table, corner_id)?;
                if !self.base.is_vertex_visited(vert_id) {
                    let on_boundary = table.is_on_boundary(vert_id);
                    self.base.visit_vertex(vert_id, corner_id);
                    if !on_boundary {
                        corner_id = table.get_right_corner(corner_id);
                        continue;
                    }
                }

                let right_corner_id = table.get_right_corner(corner_id);
                let left_corner_id = table.get_left_corner(corner_id);
                let right_visited = self.base.is_corner_face_visited(right_corner_id);
                let left_visited = self.base.is_corner_face_visited(left_corner_id);
                match (right_visited, left_visited) {
                    (true, true) => {
                        self.corner_traversal_stack.pop();
                        break;
                    }
                    (true, false) => corner_id = left_corner_id,
                    (false, true) => corner_id = right_corner_id,
                    (false, false) => {
                        // Split: the left branch waits below the right one.
                        if let Some(slot) = self.corner_traversal_stack.last_mut() {
                            *slot = left_corner_id;
                        }
                        self.corner_traversal_stack.push(right_corner_id);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn into_observer(self) -> O {
        self.base.into_observer()
    }
}
