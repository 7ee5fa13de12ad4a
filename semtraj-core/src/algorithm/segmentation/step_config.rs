use chrono::TimeDelta;
use uom::si::f64::Length;
use uom::si::length::meter;

use super::SegmentationError;

/// parameters controlling stay-point detection.
#[derive(Clone, Debug)]
pub struct StepConfig {
    /// stay-point radius D: the object must remain within a disk of this
    /// radius to be considered stopped.
    pub max_eps: Length,
    /// minimum dwell time T for a stay-point to qualify as a Stop.
    pub min_duration: TimeDelta,
    /// grid cell dimension g for the index. defaults to D * sqrt(2) / 4,
    /// which makes a single cell's diagonal half of D.
    pub grid_size: Option<Length>,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            max_eps: Length::new::<meter>(50.0),
            min_duration: TimeDelta::seconds(60),
            grid_size: None,
        }
    }
}

impl StepConfig {
    pub fn new(max_eps: Length, min_duration: TimeDelta) -> Self {
        Self {
            max_eps,
            min_duration,
            grid_size: None,
        }
    }

    pub fn with_grid_size(mut self, grid_size: Length) -> Self {
        self.grid_size = Some(grid_size);
        self
    }

    /// validates the configuration, returning the effective
    /// (max_eps, grid_size) pair in meters.
    pub fn validate(&self) -> Result<(f64, f64), SegmentationError> {
        let max_eps_meters = self.max_eps.get::<meter>();
        if max_eps_meters <= 0.0 {
            return Err(SegmentationError::InvalidConfig(format!(
                "max_eps must be positive, got {} m",
                max_eps_meters
            )));
        }
        if self.min_duration <= TimeDelta::zero() {
            return Err(SegmentationError::InvalidConfig(format!(
                "min_duration must be positive, got {}",
                self.min_duration
            )));
        }
        let grid_size_meters = match self.grid_size {
            Some(g) => {
                let g_meters = g.get::<meter>();
                if g_meters <= 0.0 {
                    return Err(SegmentationError::InvalidConfig(format!(
                        "grid_size must be positive, got {} m",
                        g_meters
                    )));
                }
                g_meters
            }
            None => (2.0_f64.sqrt() / 4.0) * max_eps_meters,
        };
        Ok((max_eps_meters, grid_size_meters))
    }
}
