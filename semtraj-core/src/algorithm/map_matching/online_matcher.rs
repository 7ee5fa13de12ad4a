use std::collections::VecDeque;
use std::sync::Arc;

use geo::Point;
use log::debug;
use uom::si::length::meter;

use super::{MapMatchingError, MatcherConfig};
use crate::algorithm::search::shortest_distance_meters;
use crate::model::fix::Fix;
use crate::model::map::SpatialIndex;
use crate::model::network::{EdgeId, Graph};
use crate::util::geo::{haversine, nearest_point_on_linestring, METERS_PER_DEGREE};

/// maximum candidate edges considered per observation
const MAX_CANDIDATES: usize = 8;

/// transition probability decay in meters: how far the route distance may
/// exceed the great-circle distance before a transition becomes unlikely,
/// scaled to typical GPS noise
const BETA_METERS: f64 = 30.0;

/// a candidate edge for one observation
struct Candidate {
    edge_id: EdgeId,
    /// great-circle distance from the observation to the edge, in meters
    distance_to_edge: f64,
    /// the observation projected onto the edge geometry
    snapped: Point<f64>,
}

/// one cell of the Viterbi trellis
struct ViterbiState {
    log_prob: f64,
    prev_state_idx: Option<usize>,
}

/// sliding-window HMM map matcher.
///
/// `process_fix` buffers fixes until `window_size` of them are held; from
/// then on every ingested fix triggers a Viterbi decode over the whole
/// buffer and releases the oldest fix, snapped and tagged with its matched
/// road id. when no plausible edge sequence exists the oldest fix passes
/// through unchanged with no road id; matching never raises.
///
/// the graph is read-only and may be shared between matcher instances.
pub struct OnlineMapMatcher {
    graph: Arc<Graph>,
    spatial_index: SpatialIndex,
    config: MatcherConfig,
    buffer: VecDeque<Fix>,
}

impl OnlineMapMatcher {
    pub fn new(graph: Arc<Graph>, config: MatcherConfig) -> Result<Self, MapMatchingError> {
        config.validate()?;
        let spatial_index = SpatialIndex::new(&graph)?;
        Ok(Self {
            graph,
            spatial_index,
            config,
            buffer: VecDeque::new(),
        })
    }

    /// ingests one fix. returns nothing while the buffer is filling; once
    /// full, returns the oldest buffered fix resolved against the network.
    pub fn process_fix(&mut self, fix: Fix) -> Option<Fix> {
        self.buffer.push_back(fix);
        if self.buffer.len() < self.config.window_size {
            return None;
        }
        let matched = self.match_oldest();
        self.buffer.pop_front();
        matched
    }

    /// drains the buffer at end-of-stream, re-matching the shrinking window
    /// for each remaining fix. idempotent on an empty buffer.
    pub fn flush(&mut self) -> Vec<Fix> {
        let mut flushed = Vec::with_capacity(self.buffer.len());
        while let Some(matched) = self.match_oldest() {
            flushed.push(matched);
            self.buffer.pop_front();
        }
        flushed
    }

    /// matches the current window and resolves the oldest fix. on match
    /// failure the raw fix is returned untouched; None only when the buffer
    /// is empty.
    fn match_oldest(&self) -> Option<Fix> {
        let oldest = self.buffer.front()?.clone();
        match self.match_window() {
            Some((edge_id, snapped)) => {
                let road_id = self.graph.edge_road_id(&edge_id).ok();
                Some(oldest.snapped_to(snapped.y(), snapped.x(), road_id))
            }
            None => {
                debug!("window match failed, passing fix through unsnapped");
                Some(oldest)
            }
        }
    }

    /// runs the Viterbi decode over the buffered window and returns the edge
    /// chosen for the oldest observation along with its snapped location.
    fn match_window(&self) -> Option<(EdgeId, Point<f64>)> {
        let observations: Vec<Point<f64>> = self.buffer.iter().map(|f| f.point()).collect();
        if observations.is_empty() {
            return None;
        }

        // candidate edges per observation. the window is truncated at the
        // first observation with no edge in range: the suffix cannot alter
        // which candidate the oldest observation settles on through a
        // broken trellis.
        let max_dist = self.config.max_dist.get::<meter>();
        let max_dist_init = self.config.max_dist_init.get::<meter>();
        let mut all_candidates: Vec<Vec<Candidate>> = Vec::with_capacity(observations.len());
        for (t, point) in observations.iter().enumerate() {
            let radius = if t == 0 { max_dist_init } else { max_dist };
            let candidates = self.find_candidates(point, radius);
            if candidates.is_empty() {
                break;
            }
            all_candidates.push(candidates);
        }
        if all_candidates.is_empty() {
            return None;
        }
        let n_obs = all_candidates.len();

        // forward pass over the trellis
        let mut all_states: Vec<Vec<ViterbiState>> = Vec::with_capacity(n_obs);
        let first_states: Vec<ViterbiState> = all_candidates[0]
            .iter()
            .map(|c| ViterbiState {
                log_prob: self.emission_log_prob(c.distance_to_edge),
                prev_state_idx: None,
            })
            .collect();
        all_states.push(first_states);

        for t in 1..n_obs {
            let gc_distance = haversine::haversine_distance_meters(
                observations[t - 1].x(),
                observations[t - 1].y(),
                observations[t].x(),
                observations[t].y(),
            )
            .unwrap_or(f64::INFINITY);

            let mut curr_states: Vec<ViterbiState> = Vec::with_capacity(all_candidates[t].len());
            for curr_cand in all_candidates[t].iter() {
                let emission_lp = self.emission_log_prob(curr_cand.distance_to_edge);
                let mut best_log_prob = f64::NEG_INFINITY;
                let mut best_prev_idx: Option<usize> = None;

                for (prev_idx, prev_cand) in all_candidates[t - 1].iter().enumerate() {
                    let prev_log_prob = all_states[t - 1][prev_idx].log_prob;
                    if prev_log_prob == f64::NEG_INFINITY {
                        continue;
                    }
                    let transition_lp = match self.route_distance(prev_cand, curr_cand, gc_distance)
                    {
                        Some(route) => self.transition_log_prob(route, gc_distance),
                        None => f64::NEG_INFINITY,
                    };
                    let total_lp = prev_log_prob + transition_lp + emission_lp;
                    if total_lp > best_log_prob {
                        best_log_prob = total_lp;
                        best_prev_idx = Some(prev_idx);
                    }
                }

                curr_states.push(ViterbiState {
                    log_prob: best_log_prob,
                    prev_state_idx: best_prev_idx,
                });
            }
            all_states.push(curr_states);
        }

        // best terminal state, pruned by the normalised path probability
        let (best_end_idx, best_end_state) = all_states[n_obs - 1]
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.log_prob
                    .partial_cmp(&b.log_prob)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
        if best_end_state.log_prob == f64::NEG_INFINITY {
            return None;
        }
        let prob_norm = (best_end_state.log_prob / n_obs as f64).exp();
        if prob_norm < self.config.min_prob_norm {
            debug!(
                "normalised path probability {:.2e} below floor {:.2e}",
                prob_norm, self.config.min_prob_norm
            );
            return None;
        }

        // backtrack to the oldest observation
        let mut state_idx = best_end_idx;
        for t in (1..n_obs).rev() {
            state_idx = match all_states[t][state_idx].prev_state_idx {
                Some(idx) => idx,
                // no surviving transition into this state; fall back to the
                // best-emission candidate one step earlier
                None => all_states[t - 1]
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| {
                        a.log_prob
                            .partial_cmp(&b.log_prob)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|(idx, _)| idx)
                    .unwrap_or(0),
            };
        }

        let chosen = &all_candidates[0][state_idx];
        Some((chosen.edge_id, chosen.snapped))
    }

    /// edges within `radius_meters` of the observation, nearest first.
    fn find_candidates(&self, point: &Point<f64>, radius_meters: f64) -> Vec<Candidate> {
        // envelope pre-filter in degrees; the 2x slack covers the longitude
        // shrink factor up to |lat| = 60
        let degree_tolerance = 2.0 * radius_meters / METERS_PER_DEGREE;

        let mut candidates: Vec<Candidate> = Vec::new();
        for (edge_id, envelope_d2) in self.spatial_index.nearest_edges_iter(point) {
            if envelope_d2.sqrt() > degree_tolerance {
                break;
            }
            let linestring = match self.graph.edge_linestring(&edge_id) {
                Ok(linestring) => linestring,
                Err(_) => continue,
            };
            let projection = match nearest_point_on_linestring(point, &linestring) {
                Some(projection) => projection,
                None => continue,
            };
            if projection.distance_meters <= radius_meters {
                candidates.push(Candidate {
                    edge_id,
                    distance_to_edge: projection.distance_meters,
                    snapped: projection.point,
                });
                if candidates.len() >= MAX_CANDIDATES {
                    break;
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.distance_to_edge
                .partial_cmp(&b.distance_to_edge)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }

    /// Gaussian emission in log form with the normalisation constant
    /// dropped; sigma is the steady-state candidacy radius.
    fn emission_log_prob(&self, distance: f64) -> f64 {
        let sigma = self.config.max_dist.get::<meter>();
        -(distance * distance) / (2.0 * sigma * sigma)
    }

    /// exponential decay in the difference between route distance and
    /// great-circle distance, log form, normalisation dropped.
    fn transition_log_prob(&self, route_distance: f64, great_circle_distance: f64) -> f64 {
        -(route_distance - great_circle_distance).abs() / BETA_METERS
    }

    /// approximate midpoint-to-midpoint travel distance between two
    /// candidate edges. directly connected edges short-circuit; everything
    /// else runs a bounded shortest-path query.
    fn route_distance(&self, from: &Candidate, to: &Candidate, gc_distance: f64) -> Option<f64> {
        if from.edge_id == to.edge_id {
            return Some(0.0);
        }

        let from_edge = self.graph.get_edge(&from.edge_id).ok()?;
        let to_edge = self.graph.get_edge(&to.edge_id).ok()?;
        let from_half = from_edge.distance.get::<meter>() / 2.0;
        let to_half = to_edge.distance.get::<meter>() / 2.0;

        if from_edge.dst_vertex_id == to_edge.src_vertex_id {
            return Some(from_half + to_half);
        }

        let cutoff = 10.0 * gc_distance + 1_000.0;
        let between = shortest_distance_meters(
            &self.graph,
            from_edge.dst_vertex_id,
            to_edge.src_vertex_id,
            Some(cutoff),
        )
        .ok()??;
        Some(between + from_half + to_half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::network::{EdgeSpec, Vertex};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn fix_at(lat: f64, lon: f64, second: i64) -> Fix {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + TimeDelta::seconds(second);
        Fix::new(lat, lon, t, "1")
    }

    /// a straight south-to-north road along lon 0, split into three edges of
    /// roughly 111 m each
    fn linear_road() -> Arc<Graph> {
        let vertices = vec![
            Vertex::new(0, 0.0, 0.0),
            Vertex::new(1, 0.0, 0.001),
            Vertex::new(2, 0.0, 0.002),
            Vertex::new(3, 0.0, 0.003),
        ];
        let edges = vec![
            EdgeSpec::new(0, 1).with_road_id("road_A"),
            EdgeSpec::new(1, 2).with_road_id("road_B"),
            EdgeSpec::new(2, 3),
        ];
        Arc::new(Graph::new(vertices, edges).unwrap())
    }

    fn matcher(window_size: usize) -> OnlineMapMatcher {
        let config = MatcherConfig {
            window_size,
            ..Default::default()
        };
        OnlineMapMatcher::new(linear_road(), config).unwrap()
    }

    #[test]
    fn test_no_output_until_window_full() {
        let mut matcher = matcher(3);
        assert!(matcher.process_fix(fix_at(0.0005, 0.00001, 0)).is_none());
        assert!(matcher.process_fix(fix_at(0.0015, 0.00001, 10)).is_none());
        // the third fix fills the window and releases exactly one output
        assert!(matcher.process_fix(fix_at(0.0025, 0.00001, 20)).is_some());
    }

    #[test]
    fn test_matches_and_snaps_along_road() {
        let mut matcher = matcher(3);
        let fixes = vec![
            fix_at(0.0005, 0.00001, 0),
            fix_at(0.0015, 0.00001, 10),
            fix_at(0.0025, 0.00001, 20),
            fix_at(0.0029, 0.00001, 30),
        ];

        let mut results = Vec::new();
        for fix in fixes {
            if let Some(matched) = matcher.process_fix(fix) {
                results.push(matched);
            }
        }
        assert_eq!(results.len(), 2);
        results.extend(matcher.flush());
        assert_eq!(results.len(), 4);

        assert_eq!(results[0].road_id.as_deref(), Some("road_A"));
        assert_eq!(results[1].road_id.as_deref(), Some("road_B"));
        // the third edge has no road metadata; its id is synthesised from
        // the endpoint vertices
        assert_eq!(results[2].road_id.as_deref(), Some("2-3"));
        assert_eq!(results[3].road_id.as_deref(), Some("2-3"));

        // snapping projects each fix onto the lon=0 road line
        for matched in &results {
            assert!(matched.lon.abs() < 1e-9);
        }
        // order and object id preserved
        assert!(results.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(results.iter().all(|r| r.obj_id == "1"));
    }

    #[test]
    fn test_match_failure_passes_fix_through() {
        // fixes a full degree away from the network: no candidates
        let mut matcher = matcher(2);
        let off_road = fix_at(1.0, 1.0, 0);
        assert!(matcher.process_fix(off_road.clone()).is_none());
        let result = matcher.process_fix(fix_at(1.0, 1.0001, 10)).unwrap();

        assert_eq!(result.road_id, None);
        assert_eq!(result.lat, off_road.lat);
        assert_eq!(result.lon, off_road.lon);
    }

    #[test]
    fn test_flush_is_idempotent_on_empty_buffer() {
        let mut matcher = matcher(3);
        assert!(matcher.flush().is_empty());
        assert!(matcher.flush().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = MatcherConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(OnlineMapMatcher::new(linear_road(), config).is_err());
    }
}
