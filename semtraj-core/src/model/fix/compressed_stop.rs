use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Fix;

/// the compact representation of a Stop: a single centroid fix plus the time
/// window the object dwelt there.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompressedStop {
    pub centroid: Fix,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl CompressedStop {
    pub fn new(centroid: Fix, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        debug_assert!(start_time <= end_time);
        Self {
            centroid,
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> chrono::TimeDelta {
        self.end_time - self.start_time
    }
}
