use geo::{LineString, Point};
use rstar::{PointDistance, RTreeObject, AABB};

use crate::model::network::EdgeId;

/// r-tree entry for one road edge: the edge id plus the bounding box of its
/// polyline geometry.
#[derive(Clone, Debug)]
pub struct EdgeRTreeObject {
    pub edge_id: EdgeId,
    pub envelope: AABB<Point<f64>>,
}

impl EdgeRTreeObject {
    /// builds an entry from an edge's polyline. returns None for a polyline
    /// without coordinates, which cannot be indexed.
    pub fn new(edge_id: EdgeId, linestring: &LineString<f64>) -> Option<EdgeRTreeObject> {
        let first = linestring.0.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for c in &linestring.0 {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        Some(EdgeRTreeObject {
            edge_id,
            envelope: AABB::from_corners(Point::new(min_x, min_y), Point::new(max_x, max_y)),
        })
    }
}

impl RTreeObject for EdgeRTreeObject {
    type Envelope = AABB<Point<f64>>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for EdgeRTreeObject {
    fn distance_2(&self, point: &Point<f64>) -> f64 {
        self.envelope.distance_2(point)
    }
}
