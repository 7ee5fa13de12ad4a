use geo::LineString;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use super::{EdgeId, VertexId};

/// represents a single directed edge in a road network Graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub edge_id: EdgeId,
    pub src_vertex_id: VertexId,
    pub dst_vertex_id: VertexId,
    /// stable road identifier carried by this edge, if the source dataset
    /// provides one. see [`super::Graph::edge_road_id`] for the fallback.
    pub road_id: Option<String>,
    pub distance: Length,
    /// polyline geometry of the edge. when absent, a straight line between
    /// the endpoint vertices is derived on demand.
    pub geometry: Option<LineString<f64>>,
}

/// edge description used to build a [`super::Graph`]. edge ids are assigned
/// by insertion order and distances are measured from the geometry during
/// graph construction.
#[derive(Clone, Debug)]
pub struct EdgeSpec {
    pub src_vertex_id: VertexId,
    pub dst_vertex_id: VertexId,
    pub road_id: Option<String>,
    pub geometry: Option<LineString<f64>>,
}

impl EdgeSpec {
    pub fn new(src_vertex_id: usize, dst_vertex_id: usize) -> Self {
        Self {
            src_vertex_id: VertexId(src_vertex_id),
            dst_vertex_id: VertexId(dst_vertex_id),
            road_id: None,
            geometry: None,
        }
    }

    pub fn with_road_id<S: Into<String>>(mut self, road_id: S) -> Self {
        self.road_id = Some(road_id.into());
        self
    }

    pub fn with_geometry(mut self, geometry: LineString<f64>) -> Self {
        self.geometry = Some(geometry);
        self
    }
}
