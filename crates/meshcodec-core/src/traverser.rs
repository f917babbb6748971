//! Shared state and callbacks of the mesh traversers.

use crate::corner_table::CornerTableView;
use crate::geometry_indices::{CornerIndex, FaceIndex, VertexIndex};
use crate::status::{corrupt, CodecResult, Status};

/// Receives faces and vertices in the order a traversal reaches them.
pub trait TraversalObserver {
    fn on_new_face_visited(&mut self, face: FaceIndex);
    /// `corner` is the corner through which `vertex` was first reached.
    fn on_new_vertex_visited(&mut self, vertex: VertexIndex, corner: CornerIndex);
}

/// Traversal strategy, stored as one byte in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMethod {
    #[default]
    DepthFirst = 0,
    MaxPredictionDegree = 1,
}

impl TraversalMethod {
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        match value {
            0 => Ok(TraversalMethod::DepthFirst),
            1 => Ok(TraversalMethod::MaxPredictionDegree),
            _ => Err(corrupt(format!("unknown traversal method {value}"))),
        }
    }
}

/// Common interface of the traversers, driven by the sequencer.
pub trait MeshTraverser {
    type Observer: TraversalObserver;

    fn num_faces(&self) -> usize;
    fn on_traversal_start(&mut self) {}
    /// Visits every face reachable from `corner` that has not been visited.
    fn traverse_from_corner(&mut self, corner: CornerIndex) -> Status;
    fn on_traversal_end(&mut self) {}
    fn into_observer(self) -> Self::Observer;
}

/// Visited flags for faces and vertices plus the observer.
pub struct TraverserBase<'a, T: CornerTableView, O: TraversalObserver> {
    corner_table: &'a T,
    observer: O,
    is_face_visited: Vec<bool>,
    is_vertex_visited: Vec<bool>,
}

impl<'a, T: CornerTableView, O: TraversalObserver> TraverserBase<'a, T, O> {
    pub fn new(corner_table: &'a T, observer: O) -> Self {
        Self {
            corner_table,
            observer,
            is_face_visited: vec![false; corner_table.num_faces()],
            is_vertex_visited: vec![false; corner_table.num_vertices()],
        }
    }

    #[inline]
    pub fn corner_table(&self) -> &'a T {
        self.corner_table
    }

    /// The invalid face counts as visited.
    #[inline]
    pub fn is_face_visited(&self, face: FaceIndex) -> bool {
        !face.is_valid() || self.is_face_visited[face.as_usize()]
    }

    /// Face test through one of its corners. The invalid corner counts as
    /// visited.
    #[inline]
    pub fn is_corner_face_visited(&self, corner: CornerIndex) -> bool {
        self.is_face_visited(self.corner_table.face(corner))
    }

    /// Marks the face and reports it.
    #[inline]
    pub fn visit_face(&mut self, face: FaceIndex) {
        self.is_face_visited[face.as_usize()] = true;
        self.observer.on_new_face_visited(face);
    }

    #[inline]
    pub fn is_vertex_visited(&self, vertex: VertexIndex) -> bool {
        self.is_vertex_visited[vertex.as_usize()]
    }

    /// Marks the vertex and reports it, unless it was seen already.
    #[inline]
    pub fn visit_vertex(&mut self, vertex: VertexIndex, corner: CornerIndex) {
        if !self.is_vertex_visited[vertex.as_usize()] {
            self.is_vertex_visited[vertex.as_usize()] = true;
            self.observer.on_new_vertex_visited(vertex, corner);
        }
    }

    pub fn into_observer(self) -> O {
        self.observer
    }
}
