//! Quality metrics for compressed trajectories: synchronised euclidean
//! distance statistics and the point-count compression ratio. used by the
//! test suite as an oracle; not part of the streaming hot path.

mod compression;
mod sed;

pub use compression::compression_ratio;
pub use sed::{calculate_sed_error, calculate_sed_stats, SedStats};
