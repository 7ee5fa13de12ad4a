//! End-to-end composition of the streaming engines: an optional map
//! matcher feeding the stay-point segmenter, with every emitted segment
//! compressed on the spot.

use log::debug;

use crate::algorithm::compression::{
    CompressionError, SquishCompressor, StcReducer, StopCompressor,
};
use crate::algorithm::map_matching::OnlineMapMatcher;
use crate::algorithm::segmentation::{SegmentationError, StepSegmenter};
use crate::model::fix::{CompressedStop, Fix, Segment};

/// a fully processed event leaving the pipeline, in segmenter emission
/// order.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    /// a Stop collapsed to its centroid and dwell window
    Stop(CompressedStop),
    /// a Move line-simplified under the configured point budget
    Move(Vec<Fix>),
    /// a map-matched Move reduced to its road-transition anchors
    SemanticMove(Vec<Fix>),
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
    #[error(transparent)]
    Compression(#[from] CompressionError),
}

/// single-object streaming pipeline.
///
/// without a matcher, Moves are SQUISH-compressed; with a matcher, fixes are
/// road-tagged first and Moves reduce to their semantic chunk list instead.
pub struct Pipeline {
    matcher: Option<OnlineMapMatcher>,
    segmenter: StepSegmenter,
    stop_compressor: StopCompressor,
    squish: SquishCompressor,
    stc: StcReducer,
}

impl Pipeline {
    pub fn new(segmenter: StepSegmenter, squish: SquishCompressor) -> Self {
        Self {
            matcher: None,
            segmenter,
            stop_compressor: StopCompressor::new(),
            squish,
            stc: StcReducer::new(),
        }
    }

    pub fn with_map_matching(matcher: OnlineMapMatcher, segmenter: StepSegmenter) -> Self {
        Self {
            matcher: Some(matcher),
            segmenter,
            stop_compressor: StopCompressor::new(),
            squish: SquishCompressor::default(),
            stc: StcReducer::new(),
        }
    }

    /// ingests one raw fix, returning any events made final by it. with a
    /// matcher attached, output lags input by the matcher window.
    pub fn process_fix(&mut self, fix: Fix) -> Result<Vec<PipelineEvent>, PipelineError> {
        let routed = match &mut self.matcher {
            Some(matcher) => matcher.process_fix(fix),
            None => Some(fix),
        };
        match routed {
            Some(fix) => self.segment(fix),
            None => Ok(Vec::new()),
        }
    }

    /// signals end-of-stream: drains the matcher window, then the segmenter
    /// cache. idempotent once everything is drained.
    pub fn flush(&mut self) -> Result<Vec<PipelineEvent>, PipelineError> {
        let mut events = Vec::new();
        let drained = match &mut self.matcher {
            Some(matcher) => matcher.flush(),
            None => Vec::new(),
        };
        for fix in drained {
            events.extend(self.segment(fix)?);
        }
        let segments = self.segmenter.flush()?;
        events.extend(self.compress(segments)?);
        Ok(events)
    }

    fn segment(&mut self, fix: Fix) -> Result<Vec<PipelineEvent>, PipelineError> {
        let segments = self.segmenter.process_fix(fix)?;
        self.compress(segments)
    }

    fn compress(&self, segments: Vec<Segment>) -> Result<Vec<PipelineEvent>, PipelineError> {
        let mut events = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                Segment::Stop(stop) => {
                    debug!("compressing stop of {} fixes", stop.points.len());
                    events.push(PipelineEvent::Stop(
                        self.stop_compressor.compress(&stop.points)?,
                    ));
                }
                Segment::Move(mv) => {
                    if self.matcher.is_some() {
                        events.push(PipelineEvent::SemanticMove(self.stc.reduce(&mv.points)));
                    } else {
                        events.push(PipelineEvent::Move(self.squish.compress(&mv.points)));
                    }
                }
            }
        }
        Ok(events)
    }
}
