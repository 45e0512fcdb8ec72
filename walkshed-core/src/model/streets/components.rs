//! Street network components - nodes and edges

use geo::{LineString, Point};

use crate::Length;

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Sequential id assigned during graph construction
    pub id: usize,
    /// Node coordinates
    pub geometry: Point<f64>,
}

/// Street graph edge (network segment)
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Traversal cost: Euclidean length in CRS linear units
    pub weight: Length,
    /// Segment geometry, oriented source to target
    pub geometry: LineString<f64>,
}

impl StreetEdge {
    pub fn length(&self) -> Length {
        self.weight
    }
}
