use chrono::{DateTime, Utc};

use crate::model::fix::ModelError;

#[derive(thiserror::Error, Debug)]
pub enum SegmentationError {
    #[error("invalid segmenter configuration: {0}")]
    InvalidConfig(String),
    #[error("fix timestamp {current} precedes previous fix timestamp {previous}")]
    OutOfOrderTimestamp {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error(transparent)]
    ModelError(#[from] ModelError),
}
