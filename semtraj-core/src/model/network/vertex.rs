use std::fmt::Display;

use geo::{coord, Coord};
use serde::{Deserialize, Serialize};

use super::VertexId;

/// represents a vertex in a road network Graph. the coordinate is stored
/// with x=lon, y=lat in the WGS84 coordinate system.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub vertex_id: VertexId,
    pub coordinate: Coord<f64>,
}

impl Vertex {
    pub fn new(vertex_id: usize, x: f64, y: f64) -> Self {
        Self {
            vertex_id: VertexId(vertex_id),
            coordinate: coord! {x: x, y: y},
        }
    }

    pub fn x(&self) -> f64 {
        self.coordinate.x
    }

    pub fn y(&self) -> f64 {
        self.coordinate.y
    }

    pub fn lon(&self) -> f64 {
        self.coordinate.x
    }

    pub fn lat(&self) -> f64 {
        self.coordinate.y
    }
}

impl Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vertex {} ({},{})", self.vertex_id, self.x(), self.y())
    }
}
