use geo::{LineString, Point};

use super::haversine;

/// result of projecting a point onto a polyline: the closest location on the
/// polyline and the great-circle distance to it in meters.
#[derive(Debug, Clone, Copy)]
pub struct PolylineProjection {
    pub point: Point<f64>,
    pub distance_meters: f64,
}

/// finds the closest point on a polyline to the given (lon, lat) point.
///
/// projection onto each segment happens in raw degree space, which is an
/// adequate approximation for the short segments found in road geometries;
/// the winning candidate is re-measured with the haversine formula. returns
/// None when the polyline has no coordinates.
pub fn nearest_point_on_linestring(
    point: &Point<f64>,
    linestring: &LineString<f64>,
) -> Option<PolylineProjection> {
    let coords = &linestring.0;
    let first = coords.first()?;

    let mut best = PolylineProjection {
        point: Point::new(first.x, first.y),
        distance_meters: haversine::haversine_distance_meters(point.x(), point.y(), first.x, first.y)
            .unwrap_or(f64::INFINITY),
    };

    for window in coords.windows(2) {
        let (start, end) = (window[0], window[1]);
        let dx = end.x - start.x;
        let dy = end.y - start.y;

        let candidate = if dx == 0.0 && dy == 0.0 {
            Point::new(start.x, start.y)
        } else {
            let t = ((point.x() - start.x) * dx + (point.y() - start.y) * dy)
                / (dx * dx + dy * dy);
            let t = t.clamp(0.0, 1.0);
            Point::new(start.x + t * dx, start.y + t * dy)
        };

        let distance = haversine::haversine_distance_meters(
            point.x(),
            point.y(),
            candidate.x(),
            candidate.y(),
        )
        .unwrap_or(f64::INFINITY);

        if distance < best.distance_meters {
            best = PolylineProjection {
                point: candidate,
                distance_meters: distance,
            };
        }
    }

    Some(best)
}
