use geo::Point;
use rstar::RTree;

use super::{EdgeRTreeObject, MapError};
use crate::model::network::{EdgeId, Graph};

/// an r-tree over the edges of a road network graph, supporting
/// nearest-edge iteration for map matching candidate generation.
///
/// envelope distance is a lower bound on the true distance to the edge
/// geometry, so callers re-measure against the polyline before accepting a
/// candidate.
pub struct SpatialIndex {
    rtree: RTree<EdgeRTreeObject>,
}

impl SpatialIndex {
    /// builds the index over every edge in the graph.
    pub fn new(graph: &Graph) -> Result<SpatialIndex, MapError> {
        let mut entries: Vec<EdgeRTreeObject> = Vec::with_capacity(graph.n_edges());
        for edge in graph.edges.iter() {
            let linestring = graph.edge_linestring(&edge.edge_id)?;
            let entry = EdgeRTreeObject::new(edge.edge_id, &linestring).ok_or_else(|| {
                MapError::BuildError(format!("edge {} has empty geometry", edge.edge_id))
            })?;
            entries.push(entry);
        }
        let rtree = RTree::bulk_load(entries);
        Ok(SpatialIndex { rtree })
    }

    /// iterates over edges ordered by envelope distance to the given
    /// (lon, lat) point. the squared distance is in degree units.
    pub fn nearest_edges_iter<'a>(
        &'a self,
        point: &'a Point<f64>,
    ) -> impl Iterator<Item = (EdgeId, f64)> + 'a {
        self.rtree
            .nearest_neighbor_iter_with_distance_2(point)
            .map(|(obj, distance_2)| (obj.edge_id, distance_2))
    }
}
