//! Streaming semantic trajectory compression.
//!
//! Ingests a time-ordered stream of GPS fixes from one moving object and
//! emits a compact semantic representation of its trajectory: Stops (places
//! the object dwelt) and Moves (the travel in between), detected and
//! compressed online with bounded work per fix.
//!
//! The crate is organised around three engines:
//!
//! - [`algorithm::segmentation`] - grid-indexed streaming stay-point
//!   detection partitioning the fix stream into Stop and Move segments
//! - [`algorithm::compression`] - per-segment reduction: centroid collapse
//!   for Stops, SED-priority bounded-buffer line simplification for Moves,
//!   and road-transition reduction for map-matched Moves
//! - [`algorithm::map_matching`] - a sliding-window Viterbi matcher that
//!   snaps raw fixes onto a road network and tags them with road ids
//!
//! [`pipeline::Pipeline`] wires the engines together; [`io`] provides a CSV
//! fix source and [`metrics`] the SED-based quality oracle used in tests.

pub mod algorithm;
pub mod io;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod util;
