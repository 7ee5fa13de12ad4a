pub mod haversine;
mod polyline;

pub use polyline::{nearest_point_on_linestring, PolylineProjection};

/// approximate metres spanned by one degree of latitude on WGS84.
/// longitude degrees additionally scale by cos(latitude).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// flat-earth distance approximation in meters between two (lon, lat) coordinates.
/// adequate for short spatial extents such as stay-point detection; callers
/// covering long distances or wide latitude spans should prefer
/// [`haversine::haversine_distance_meters`].
pub fn flat_distance_meters(src: geo::Coord<f64>, dst: geo::Coord<f64>) -> f64 {
    let lat_rad = ((src.y + dst.y) / 2.0).to_radians();
    let dx = (dst.x - src.x).to_radians() * lat_rad.cos();
    let dy = (dst.y - src.y).to_radians();
    haversine::APPROX_EARTH_RADIUS_M * (dx * dx + dy * dy).sqrt()
}
