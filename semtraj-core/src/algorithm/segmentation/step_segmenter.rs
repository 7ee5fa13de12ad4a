use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;

use super::{SegmentationError, StepConfig};
use crate::model::fix::{Fix, Segment};
use crate::util::geo::{flat_distance_meters, haversine::APPROX_EARTH_RADIUS_M};

struct CacheEntry {
    fix: Fix,
    gx: i64,
    gy: i64,
}

/// online stay-point segmenter.
///
/// fixes are cached with their grid cell in a local tangent plane anchored
/// at the first fix. each arriving fix walks the cache backwards, using the
/// cell offsets to classify predecessors as confirmed-inside, pruned-outside,
/// or needing an exact distance test; when the window of nearby predecessors
/// spans at least the minimum duration, a stay-point is formed and the
/// segmentation cases decide what to emit.
///
/// cache indices are absolute: they never reuse values across pruning, so an
/// in-progress stay-point survives cache compaction unchanged.
pub struct StepSegmenter {
    max_eps_meters: f64,
    min_duration: TimeDelta,
    grid_size_meters: f64,
    /// squared cell-unit radius (D / g)^2 used by the grid classification
    threshold_sq: f64,
    /// local tangent-plane origin in radians, fixed at the very first fix
    origin: Option<(f64, f64)>,
    cache: VecDeque<CacheEntry>,
    /// absolute index of cache[0]
    cache_offset: usize,
    /// absolute [start, end] indices of the in-progress stay-point
    current_sp: Option<(usize, usize)>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl StepSegmenter {
    pub fn new(config: StepConfig) -> Result<Self, SegmentationError> {
        let (max_eps_meters, grid_size_meters) = config.validate()?;
        let threshold_sq = (max_eps_meters / grid_size_meters).powi(2);
        Ok(Self {
            max_eps_meters,
            min_duration: config.min_duration,
            grid_size_meters,
            threshold_sq,
            origin: None,
            cache: VecDeque::new(),
            cache_offset: 0,
            current_sp: None,
            last_timestamp: None,
        })
    }

    /// ingests one fix and returns any segments whose extent is now final.
    ///
    /// fixes must arrive in non-decreasing timestamp order; a fix older than
    /// its predecessor is rejected without touching segmenter state.
    pub fn process_fix(&mut self, fix: Fix) -> Result<Vec<Segment>, SegmentationError> {
        if let Some(previous) = self.last_timestamp {
            if fix.timestamp < previous {
                return Err(SegmentationError::OutOfOrderTimestamp {
                    previous,
                    current: fix.timestamp,
                });
            }
        }
        self.last_timestamp = Some(fix.timestamp);

        let (origin_lat, origin_lon) = *self
            .origin
            .get_or_insert((fix.lat.to_radians(), fix.lon.to_radians()));

        let dx_meters =
            (fix.lon.to_radians() - origin_lon) * APPROX_EARTH_RADIUS_M * origin_lat.cos();
        let dy_meters = (fix.lat.to_radians() - origin_lat) * APPROX_EARTH_RADIUS_M;
        let gx = (dx_meters / self.grid_size_meters).floor() as i64;
        let gy = (dy_meters / self.grid_size_meters).floor() as i64;

        self.cache.push_back(CacheEntry {
            fix: fix.clone(),
            gx,
            gy,
        });
        let c = self.cache_offset + self.cache.len() - 1;

        let stay_start = self.find_stay_start(&fix, gx, gy, c);
        self.handle_segmentation(&fix, stay_start, c)
    }

    /// indexed stay-point search: walks backwards from the predecessor of
    /// the newest fix (absolute index `c`), returning the earliest absolute
    /// index whose suffix stays within max_eps of the new fix, provided that
    /// window spans min_duration.
    fn find_stay_start(&self, fix: &Fix, gx: i64, gy: i64, c: usize) -> Option<usize> {
        let offset = self.cache_offset as i64;
        let mut i = c as i64 - 1;

        while i >= offset {
            let entry = &self.cache[(i - offset) as usize];
            let delta_x = (entry.gx - gx).abs() as f64;
            let delta_y = (entry.gy - gy).abs() as f64;

            if (delta_x + 1.0).powi(2) + (delta_y + 1.0).powi(2) <= self.threshold_sq {
                // confirmed: inside D no matter where in the cells both points sit
                i -= 1;
            } else if (delta_x - 1.0).max(0.0).powi(2) + (delta_y - 1.0).max(0.0).powi(2)
                > self.threshold_sq
            {
                // pruned: outside D no matter what; restore i to last confirmed
                i += 1;
                break;
            } else if flat_distance_meters(fix.coord(), entry.fix.coord()) <= self.max_eps_meters {
                i -= 1;
            } else {
                i += 1;
                break;
            }
        }

        let first = i.max(offset) as usize;
        let anchor = self.get_fix(first);
        if fix.timestamp - anchor.timestamp >= self.min_duration {
            Some(first)
        } else {
            None
        }
    }

    fn handle_segmentation(
        &mut self,
        fix: &Fix,
        stay_start: Option<usize>,
        c: usize,
    ) -> Result<Vec<Segment>, SegmentationError> {
        let mut segments = Vec::new();

        match (stay_start, self.current_sp) {
            (Some(sp_start_new), Some((sp_start, sp_end))) => {
                if sp_start_new <= sp_end {
                    // case 1.2: new stay-point intersects the current one; merge
                    self.current_sp = Some((sp_start, c));
                } else {
                    // case 1.1: disjoint; flush the current stay-point and the
                    // move travelled in between
                    debug!(
                        "stay-point [{}, {}] closed by disjoint stay-point at [{}, {}]",
                        sp_start, sp_end, sp_start_new, c
                    );
                    segments.push(Segment::stop(self.points_range(sp_start, sp_end + 1))?);
                    let move_points = self.points_range(sp_end + 1, sp_start_new);
                    if !move_points.is_empty() {
                        segments.push(Segment::moving(move_points)?);
                    }
                    self.current_sp = Some((sp_start_new, c));
                    self.prune_cache(sp_start_new);
                }
            }
            (Some(sp_start_new), None) => {
                // case 1.3: first stay-point; anything before it was a move
                let move_points = self.points_range(self.cache_offset, sp_start_new);
                if !move_points.is_empty() {
                    segments.push(Segment::moving(move_points)?);
                }
                self.current_sp = Some((sp_start_new, c));
                self.prune_cache(sp_start_new);
            }
            (None, Some((sp_start, sp_end))) => {
                let sp_end_fix = self.get_fix(sp_end);
                if flat_distance_meters(fix.coord(), sp_end_fix.coord()) > self.max_eps_meters {
                    // case 2.1: departed the stay-point disk; the stop is final
                    debug!(
                        "stay-point [{}, {}] closed by departure at index {}",
                        sp_start, sp_end, c
                    );
                    segments.push(Segment::stop(self.points_range(sp_start, sp_end + 1))?);
                    self.prune_cache(sp_end + 1);
                    self.current_sp = None;
                }
                // case 2.2: still near the stay-point; nothing to emit
            }
            (None, None) => {
                // case 2.3: ordinary travel; nothing to emit
            }
        }

        Ok(segments)
    }

    /// emits whatever remains cached at end-of-stream: the in-progress
    /// stay-point as a Stop plus any trailing move, or all cached points as
    /// one Move. idempotent on an empty segmenter.
    pub fn flush(&mut self) -> Result<Vec<Segment>, SegmentationError> {
        let mut segments = Vec::new();
        let end = self.cache_offset + self.cache.len();

        match self.current_sp.take() {
            Some((sp_start, sp_end)) => {
                segments.push(Segment::stop(self.points_range(sp_start, sp_end + 1))?);
                let move_points = self.points_range(sp_end + 1, end);
                if !move_points.is_empty() {
                    segments.push(Segment::moving(move_points)?);
                }
            }
            None => {
                let move_points = self.points_range(self.cache_offset, end);
                if !move_points.is_empty() {
                    segments.push(Segment::moving(move_points)?);
                }
            }
        }

        self.cache.clear();
        self.cache_offset = end;
        Ok(segments)
    }

    /// batch helper: processes a whole trajectory and flushes.
    pub fn process<I: IntoIterator<Item = Fix>>(
        &mut self,
        fixes: I,
    ) -> Result<Vec<Segment>, SegmentationError> {
        let mut segments = Vec::new();
        for fix in fixes {
            segments.extend(self.process_fix(fix)?);
        }
        segments.extend(self.flush()?);
        Ok(segments)
    }

    fn get_fix(&self, abs_index: usize) -> &Fix {
        &self.cache[abs_index - self.cache_offset].fix
    }

    /// clones the fixes in the absolute index range [start, end)
    fn points_range(&self, start_abs: usize, end_abs_exclusive: usize) -> Vec<Fix> {
        if end_abs_exclusive <= start_abs {
            return Vec::new();
        }
        let rel_start = start_abs.saturating_sub(self.cache_offset);
        let rel_end = (end_abs_exclusive - self.cache_offset).min(self.cache.len());
        self.cache
            .iter()
            .skip(rel_start)
            .take(rel_end.saturating_sub(rel_start))
            .map(|entry| entry.fix.clone())
            .collect()
    }

    fn prune_cache(&mut self, new_start_abs: usize) {
        if new_start_abs > self.cache_offset {
            let to_remove = (new_start_abs - self.cache_offset).min(self.cache.len());
            self.cache.drain(..to_remove);
            self.cache_offset = new_start_abs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uom::si::f64::Length;
    use uom::si::length::meter;

    fn fix_at(lat: f64, lon: f64, minute: i64) -> Fix {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap() + TimeDelta::minutes(minute);
        Fix::new(lat, lon, t, "obj1")
    }

    fn segmenter(max_eps_m: f64, min_duration_s: i64) -> StepSegmenter {
        let config = StepConfig::new(
            Length::new::<meter>(max_eps_m),
            TimeDelta::seconds(min_duration_s),
        );
        StepSegmenter::new(config).unwrap()
    }

    #[test]
    fn test_stationary_stream_flushes_one_stop() {
        let mut segmenter = segmenter(50.0, 120);
        let mut segments = Vec::new();
        for minute in 0..10 {
            segments.extend(segmenter.process_fix(fix_at(0.0, 0.0, minute)).unwrap());
        }
        segments.extend(segmenter.flush().unwrap());

        assert_eq!(segments.len(), 1);
        match &segments[0] {
            Segment::Stop(stop) => {
                assert_eq!(stop.points.len(), 10);
                assert!(stop.centroid.lat.abs() < 1e-9);
            }
            Segment::Move(_) => panic!("expected a Stop"),
        }
    }

    #[test]
    fn test_departure_closes_stop() {
        let mut segmenter = segmenter(50.0, 120);
        let mut segments = Vec::new();
        for minute in 0..5 {
            segments.extend(segmenter.process_fix(fix_at(0.0, 0.0, minute)).unwrap());
        }
        // jump roughly 1 km north, far outside the 50 m disk
        segments.extend(segmenter.process_fix(fix_at(0.01, 0.0, 5)).unwrap());

        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_stop());
        assert_eq!(segments[0].len(), 5);

        // the departing fix is still cached and flushes as a Move
        let trailing = segmenter.flush().unwrap();
        assert_eq!(trailing.len(), 1);
        assert!(!trailing[0].is_stop());
        assert_eq!(trailing[0].len(), 1);
    }

    #[test]
    fn test_single_fix_flushes_as_move() {
        let mut segmenter = segmenter(50.0, 120);
        assert!(segmenter.process_fix(fix_at(0.0, 0.0, 0)).unwrap().is_empty());
        let segments = segmenter.flush().unwrap();
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_stop());
        assert_eq!(segments[0].len(), 1);
    }

    #[test]
    fn test_flush_is_idempotent_on_empty_state() {
        let mut segmenter = segmenter(50.0, 120);
        assert!(segmenter.flush().unwrap().is_empty());
        assert!(segmenter.flush().unwrap().is_empty());
    }

    #[test]
    fn test_out_of_order_fix_rejected() {
        let mut segmenter = segmenter(50.0, 120);
        segmenter.process_fix(fix_at(0.0, 0.0, 5)).unwrap();
        let result = segmenter.process_fix(fix_at(0.0, 0.0, 1));
        assert!(matches!(
            result,
            Err(SegmentationError::OutOfOrderTimestamp { .. })
        ));
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let mut segmenter = segmenter(50.0, 120);
        segmenter.process_fix(fix_at(0.0, 0.0, 0)).unwrap();
        assert!(segmenter.process_fix(fix_at(0.0, 0.0001, 0)).is_ok());
    }

    #[test]
    fn test_coverage_is_a_subsequence_of_input() {
        // stop, travel, stop; every input fix must reappear in emission order
        let mut input = Vec::new();
        for minute in 0..8 {
            input.push(fix_at(0.0, 0.0, minute));
        }
        for (step, minute) in (8..12).enumerate() {
            let frac = (step + 1) as f64 / 5.0;
            input.push(fix_at(0.002 * frac, 0.002 * frac, minute));
        }
        for minute in 12..20 {
            input.push(fix_at(0.002, 0.002, minute));
        }

        let mut segmenter = segmenter(50.0, 120);
        let segments = segmenter.process(input.clone()).unwrap();

        let emitted: Vec<Fix> = segments
            .into_iter()
            .flat_map(|s| s.into_points())
            .collect();
        assert_eq!(emitted, input);
    }

    #[test]
    fn test_two_stops_detected_with_move_between() {
        // dwell at A, travel at ~157 m/min (fast enough that no travel
        // window of min_duration fits inside the stay radius), dwell at B
        let mut input = Vec::new();
        for minute in 0..10 {
            input.push(fix_at(0.0, 0.0, minute));
        }
        for (step, minute) in (10..20).enumerate() {
            let frac = (step + 1) as f64 / 10.0;
            input.push(fix_at(0.01 * frac, 0.01 * frac, minute as i64));
        }
        for minute in 20..30 {
            input.push(fix_at(0.01, 0.01, minute));
        }

        let mut segmenter = segmenter(50.0, 120);
        let segments = segmenter.process(input).unwrap();

        let stops: Vec<_> = segments.iter().filter(|s| s.is_stop()).collect();
        assert_eq!(stops.len(), 2, "expected exactly two stops");

        match stops[0] {
            Segment::Stop(stop) => {
                assert!(stop.centroid.lat.abs() < 1e-4);
                assert!(stop.centroid.lon.abs() < 1e-4);
            }
            _ => unreachable!(),
        }
        match stops[1] {
            Segment::Stop(stop) => {
                assert!((stop.centroid.lat - 0.01).abs() < 1e-4);
                assert!((stop.centroid.lon - 0.01).abs() < 1e-4);
            }
            _ => unreachable!(),
        }

        // outputs are time-ordered across segments
        for pair in segments.windows(2) {
            assert!(pair[0].end_time() <= pair[1].start_time());
        }
    }

    #[test]
    fn test_slow_drift_chains_into_one_stop() {
        // travel slower than max_eps / min_duration keeps every
        // min_duration window inside the disk, so the stay-point chains
        // across the drift instead of splitting
        let mut input = Vec::new();
        for minute in 0..10 {
            input.push(fix_at(0.0, 0.0, minute));
        }
        for (step, minute) in (10..20).enumerate() {
            let frac = (step + 1) as f64 / 10.0;
            input.push(fix_at(0.001 * frac, 0.001 * frac, minute as i64));
        }
        for minute in 20..30 {
            input.push(fix_at(0.001, 0.001, minute));
        }

        let mut segmenter = segmenter(50.0, 120);
        let segments = segmenter.process(input).unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].is_stop());
        assert_eq!(segments[0].len(), 30);
    }
}
