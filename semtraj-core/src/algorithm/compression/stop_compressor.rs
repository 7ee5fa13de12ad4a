use super::CompressionError;
use crate::model::fix::{CompressedStop, Fix};

/// collapses the member fixes of a Stop into a centroid plus time window.
#[derive(Debug, Default)]
pub struct StopCompressor;

impl StopCompressor {
    pub fn new() -> Self {
        Self
    }

    /// the centroid carries the arithmetic mean of the member coordinates,
    /// the timestamp of the first member, and the shared object id.
    pub fn compress(&self, points: &[Fix]) -> Result<CompressedStop, CompressionError> {
        let first = points.first().ok_or(CompressionError::EmptyInput)?;
        let last = points.last().ok_or(CompressionError::EmptyInput)?;

        let n = points.len() as f64;
        let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;

        let centroid = Fix::new(lat, lon, first.timestamp, first.obj_id.clone());
        Ok(CompressedStop::new(
            centroid,
            first.timestamp,
            last.timestamp,
        ))
    }
}
