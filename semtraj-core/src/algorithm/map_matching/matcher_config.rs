use uom::si::f64::Length;
use uom::si::length::meter;

use super::MapMatchingError;

/// parameters controlling the sliding-window HMM matcher.
#[derive(Clone, Debug)]
pub struct MatcherConfig {
    /// how many fixes the buffer holds before matching begins. a larger
    /// window gives the decoder more future context at the price of
    /// `window_size - 1` fixes of emission latency.
    pub window_size: usize,
    /// edge candidacy radius at steady state, in meters.
    pub max_dist: Length,
    /// edge candidacy radius for the first observation of a window match.
    pub max_dist_init: Length,
    /// floor on the normalised path probability; windows decoding below it
    /// are treated as match failures.
    pub min_prob_norm: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            window_size: 15,
            max_dist: Length::new::<meter>(50.0),
            max_dist_init: Length::new::<meter>(100.0),
            min_prob_norm: 1e-3,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), MapMatchingError> {
        if self.window_size < 1 {
            return Err(MapMatchingError::InvalidConfig(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.max_dist.get::<meter>() <= 0.0 {
            return Err(MapMatchingError::InvalidConfig(format!(
                "max_dist must be positive, got {} m",
                self.max_dist.get::<meter>()
            )));
        }
        if self.max_dist_init.get::<meter>() <= 0.0 {
            return Err(MapMatchingError::InvalidConfig(format!(
                "max_dist_init must be positive, got {} m",
                self.max_dist_init.get::<meter>()
            )));
        }
        if !(0.0..1.0).contains(&self.min_prob_norm) || self.min_prob_norm == 0.0 {
            return Err(MapMatchingError::InvalidConfig(format!(
                "min_prob_norm must lie in (0, 1), got {}",
                self.min_prob_norm
            )));
        }
        Ok(())
    }
}
