//! Streaming stay-point segmentation.
//!
//! Partitions a live fix stream into [`Segment::Stop`] and [`Segment::Move`]
//! events with bounded per-fix cost, using a grid index anchored at the first
//! fix to short-circuit most distance tests.
//!
//! [`Segment::Stop`]: crate::model::fix::Segment::Stop
//! [`Segment::Move`]: crate::model::fix::Segment::Move

mod segmentation_error;
mod step_config;
mod step_segmenter;

pub use segmentation_error::SegmentationError;
pub use step_config::StepConfig;
pub use step_segmenter::StepSegmenter;
