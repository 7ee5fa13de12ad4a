use std::fmt::Display;

use chrono::{DateTime, Utc};
use geo::{coord, Coord, Point};
use serde::{Deserialize, Serialize};

/// a single GPS observation of one moving object.
///
/// fixes are value-immutable: enrichment steps such as map matching produce
/// new instances via [`Fix::with_road_id`] or [`Fix::snapped_to`] rather than
/// mutating shared state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
    pub obj_id: String,
    /// identifier of the road this fix was matched to, populated by the
    /// map matcher. absent on raw input.
    #[serde(default)]
    pub road_id: Option<String>,
}

impl Fix {
    pub fn new<S: Into<String>>(lat: f64, lon: f64, timestamp: DateTime<Utc>, obj_id: S) -> Self {
        Self {
            lat,
            lon,
            timestamp,
            obj_id: obj_id.into(),
            road_id: None,
        }
    }

    /// the fix location as a (lon, lat) coordinate. x=lon, y=lat, matching
    /// the axis order of the geometry primitives.
    pub fn coord(&self) -> Coord<f64> {
        coord! {x: self.lon, y: self.lat}
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// returns a copy of this fix carrying the given road id.
    pub fn with_road_id(&self, road_id: Option<String>) -> Fix {
        Fix {
            road_id,
            ..self.clone()
        }
    }

    /// returns a copy of this fix relocated to a snapped position and
    /// carrying the given road id.
    pub fn snapped_to(&self, lat: f64, lon: f64, road_id: Option<String>) -> Fix {
        Fix {
            lat,
            lon,
            road_id,
            ..self.clone()
        }
    }
}

impl Display for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fix[{}] ({},{}) @ {}",
            self.obj_id, self.lat, self.lon, self.timestamp
        )
    }
}
