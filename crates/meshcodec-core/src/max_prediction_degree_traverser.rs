use crate::corner_table::CornerTableView;
use crate::geometry_indices::{CornerIndex, VertexIndex, INVALID_CORNER_INDEX};
use crate::status::{malformed, CodecError, Status};
use crate::traverser::{MeshTraverser, TraversalObserver, TraverserBase};

const MAX_PRIORITY: usize = 3;

/// Traversal that prefers faces whose tip vertex already has many decoded
/// neighbours, which gives parallelogram predictors more to work with.
///
/// Candidate corners sit in one stack per priority (0 is best). A candidate
/// that is at least as good as the best queued one is entered directly.
pub struct MaxPredictionDegreeTraverser<'a, T: CornerTableView, O: TraversalObserver> {
    base: TraverserBase<'a, T, O>,
    traversal_stacks: [Vec<CornerIndex>; MAX_PRIORITY],
    best_priority: usize,
    prediction_degree: Vec<u32>,
}

impl<'a, T: CornerTableView, O: TraversalObserver> MaxPredictionDegreeTraverser<'a, T, O> {
    pub fn new(corner_table: &'a T, observer: O) -> Self {
        Self {
            base: TraverserBase::new(corner_table, observer),
            traversal_stacks: Default::default(),
            best_priority: 0,
            prediction_degree: Vec::new(),
        }
    }

    fn pop_next_corner_to_traverse(&mut self) -> CornerIndex {
        for i in self.best_priority..MAX_PRIORITY {
            if let Some(corner) = self.traversal_stacks[i].pop() {
                self.best_priority = i;
                return corner;
            }
        }
        INVALID_CORNER_INDEX
    }

    fn add_corner_to_traversal_stack(&mut self, corner: CornerIndex, priority: usize) {
        self.traversal_stacks[priority].push(corner);
        if priority < self.best_priority {
            self.best_priority = priority;
        }
    }

    /// 0 when the tip vertex is already known, otherwise 1 once the tip has
    /// been offered more than once and 2 on the first offer.
    fn compute_priority(&mut self, corner: CornerIndex) -> Result<usize, CodecError> {
        let v_tip = self.vertex_of(corner)?;
        let mut priority = 0;
        if !self.base.is_vertex_visited(v_tip) {
            let degree = &mut self.prediction_degree[v_tip.as_usize()];
            *degree += 1;
            priority = if *degree > 1 { 1 } else { 2 };
        }
        Ok(priority.min(MAX_PRIORITY - 1))
    }

    fn vertex_of(&self, corner: CornerIndex) -> Result<VertexIndex, CodecError> {
        let table = self.base.corner_table();
        let v = table.vertex(corner);
        if !v.is_valid() || v.as_usize() >= table.num_vertices() {
            return Err(malformed(format!("corner {} has no valid vertex", corner.0)));
        }
        Ok(v)
    }
}

impl<T: CornerTableView, O: TraversalObserver> MeshTraverser for MaxPredictionDegreeTraverser<'_, T, O> {
    type Observer = O;

    fn num_faces(&self) -> usize {
        self.base.corner_table().num_faces()
    }

    fn on_traversal_start(&mut self) {
        self.prediction_degree = vec![0; self.base.corner_table().num_vertices()];
    }

    fn traverse_from_corner(&mut self, start: CornerIndex) -> Status {
        if self.prediction_degree.is_empty() {
            return Ok(());
        }
        let table = self.base.corner_table();
        self.traversal_stacks[0].push(start);
        self.best_priority = 0;

        for c in [table.next(start), table.previous(start), start] {
            let v = self.vertex_of(c)?;
            self.base.visit_vertex(v, c);
        }

        loop {
            let mut corner_id = self.pop_next_corner_to_traverse();
            if !corner_id.is_valid() {
                break;
            }
            if self.base.is_corner_face_visited(corner_id) {
                continue;
            }
            loop {
                self.base.visit_face(table.face(corner_id));
                let vert_id = self.vertex_of(corner_id)?;
                self.base.visit_vertex(vert_id, corner_id);

                let right_corner_id = table.get_right_corner(corner_id);
                let left_corner_id = table.get_left_corner(corner_id);
                let right_visited = self.base.is_corner_face_visited(right_corner_id);
                let left_visited = self.base.is_corner_face_visited(left_corner_id);

                if !left_visited {
                    let priority = self.compute_priority(left_corner_id)?;
                    if right_visited && priority <= self.best_priority {
                        corner_id = left_corner_id;
                        continue;
                    }
                    self.add_corner_to_traversal_stack(left_corner_id, priority);
                }
                if !right_visited {
                    let priority = self.compute_priority(right_corner_id)?;
                    if priority <= self.best_priority {
                        corner_id = right_corner_id;
                        continue;
                    }
                    self.add_corner_to_traversal_stack(right_corner_id, priority);
                }
                break;
            }
        }
        Ok(())
    }

    fn into_observer(self) -> O {
        self.base.into_observer()
    }
}
