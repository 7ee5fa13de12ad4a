//! Per-segment compressors: Stops collapse to centroids, Moves are
//! line-simplified under a point budget, and map-matched Moves reduce to
//! their road-transition anchors.

mod compression_error;
mod squish;
mod stc_reducer;
mod stop_compressor;

pub use compression_error::CompressionError;
pub use squish::SquishCompressor;
pub use stc_reducer::StcReducer;
pub use stop_compressor::StopCompressor;
