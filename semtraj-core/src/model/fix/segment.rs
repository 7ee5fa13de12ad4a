use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Fix, ModelError};

/// a maximal sub-trajectory during which the object dwelt within a small
/// disk. the centroid carries the arithmetic mean of the member coordinates,
/// the timestamp of the first member, and the shared object id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub points: Vec<Fix>,
    pub centroid: Fix,
}

/// the inter-stop travel: an ordered, time-monotonic sub-trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub points: Vec<Fix>,
}

/// a segment of one object's trajectory. downstream consumers dispatch on
/// the tag: Stops are collapsed to centroids, Moves are line-simplified or
/// semantically reduced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Stop(Stop),
    Move(Move),
}

impl Stop {
    pub fn new(points: Vec<Fix>) -> Result<Self, ModelError> {
        let first = points.first().ok_or(ModelError::EmptySegment("Stop"))?;
        let n = points.len() as f64;
        let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
        let centroid = Fix::new(lat, lon, first.timestamp, first.obj_id.clone());
        Ok(Self { points, centroid })
    }
}

impl Move {
    pub fn new(points: Vec<Fix>) -> Result<Self, ModelError> {
        if points.is_empty() {
            return Err(ModelError::EmptySegment("Move"));
        }
        Ok(Self { points })
    }
}

impl Segment {
    pub fn stop(points: Vec<Fix>) -> Result<Self, ModelError> {
        Stop::new(points).map(Segment::Stop)
    }

    pub fn moving(points: Vec<Fix>) -> Result<Self, ModelError> {
        Move::new(points).map(Segment::Move)
    }

    pub fn points(&self) -> &[Fix] {
        match self {
            Segment::Stop(s) => &s.points,
            Segment::Move(m) => &m.points,
        }
    }

    pub fn into_points(self) -> Vec<Fix> {
        match self {
            Segment::Stop(s) => s.points,
            Segment::Move(m) => m.points,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Segment::Stop(_))
    }

    pub fn len(&self) -> usize {
        self.points().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points().is_empty()
    }

    /// timestamp of the first member. constructors guarantee non-emptiness.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.points()
            .first()
            .map(|p| p.timestamp)
            .unwrap_or_default()
    }

    /// timestamp of the last member. constructors guarantee non-emptiness.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.points()
            .last()
            .map(|p| p.timestamp)
            .unwrap_or_default()
    }
}
