use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

use super::CompressionError;
use crate::model::fix::Fix;

/// eviction priority: the synchronised euclidean distance error a node would
/// incur if removed, tie-broken by original position so equal-error victims
/// are evicted in insertion order. wrapped in Reverse because the queue pops
/// its maximum and we always want the cheapest victim.
type Priority = Reverse<(OrderedFloat<f64>, usize)>;

struct Node {
    prev: Option<usize>,
    next: Option<usize>,
}

/// bounded-buffer line simplification (SQUISH).
///
/// retains at most `capacity` fixes of a Move, always including the first
/// and last, evicting whichever interior fix currently contributes least to
/// trajectory fidelity under SED. the original-position arena plus an
/// indexed priority queue replace the paper's lazy-deletion heap: removing
/// or re-prioritising a node is a keyed queue operation, so no stale entries
/// accumulate.
#[derive(Debug)]
pub struct SquishCompressor {
    capacity: usize,
}

impl SquishCompressor {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Result<Self, CompressionError> {
        if capacity < 3 {
            return Err(CompressionError::InvalidCapacity(capacity));
        }
        Ok(Self { capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// compresses to the configured capacity.
    pub fn compress(&self, points: &[Fix]) -> Vec<Fix> {
        run(points, self.capacity)
    }

    /// compresses to a per-call capacity override.
    pub fn compress_with_capacity(
        &self,
        points: &[Fix],
        capacity: usize,
    ) -> Result<Vec<Fix>, CompressionError> {
        if capacity < 3 {
            return Err(CompressionError::InvalidCapacity(capacity));
        }
        Ok(run(points, capacity))
    }
}

impl Default for SquishCompressor {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
        }
    }
}

fn run(points: &[Fix], capacity: usize) -> Vec<Fix> {
    if points.len() <= capacity {
        return points.to_vec();
    }

    let mut nodes: Vec<Node> = (0..points.len())
        .map(|_| Node {
            prev: None,
            next: None,
        })
        .collect();
    let mut queue: PriorityQueue<usize, Priority> = PriorityQueue::new();
    let mut tail: Option<usize> = None;
    let mut live = 0_usize;

    for i in 0..points.len() {
        // append at the tail; the former tail now has both neighbours and
        // becomes evictable
        if let Some(t) = tail {
            nodes[t].next = Some(i);
            nodes[i].prev = Some(t);
            if let Some(tp) = nodes[t].prev {
                let error = sed_error_degrees(&points[t], &points[tp], &points[i]);
                queue.push(t, Reverse((OrderedFloat(error), t)));
            }
        }
        tail = Some(i);
        live += 1;

        if live > capacity {
            if let Some((victim, _)) = queue.pop() {
                unlink(victim, points, &mut nodes, &mut queue);
                live -= 1;
            }
        }
    }

    let mut result = Vec::with_capacity(capacity);
    let mut cursor = Some(0_usize);
    while let Some(idx) = cursor {
        result.push(points[idx].clone());
        cursor = nodes[idx].next;
    }
    result
}

/// removes a node from the live list and refreshes the priorities of its
/// former neighbours, which are now adjacent to each other.
fn unlink(
    victim: usize,
    points: &[Fix],
    nodes: &mut [Node],
    queue: &mut PriorityQueue<usize, Priority>,
) {
    let prev = nodes[victim].prev;
    let next = nodes[victim].next;
    if let Some(p) = prev {
        nodes[p].next = next;
    }
    if let Some(n) = next {
        nodes[n].prev = prev;
    }

    if let (Some(p), Some(n)) = (prev, next) {
        if let Some(pp) = nodes[p].prev {
            let error = sed_error_degrees(&points[p], &points[pp], &points[n]);
            queue.push(p, Reverse((OrderedFloat(error), p)));
        }
        if let Some(nn) = nodes[n].next {
            let error = sed_error_degrees(&points[n], &points[p], &points[nn]);
            queue.push(n, Reverse((OrderedFloat(error), n)));
        }
    }
}

/// SED error of `mid` against the temporal interpolation of (start, end), in
/// raw degree space. priorities are only ever compared against each other
/// within one compression run, so no metric scaling is applied.
fn sed_error_degrees(mid: &Fix, start: &Fix, end: &Fix) -> f64 {
    let t_start = start.timestamp.timestamp_millis() as f64;
    let t_mid = mid.timestamp.timestamp_millis() as f64;
    let t_end = end.timestamp.timestamp_millis() as f64;

    if t_start == t_end {
        return 0.0;
    }

    let ratio = (t_mid - t_start) / (t_end - t_start);
    let lat_pred = start.lat + (end.lat - start.lat) * ratio;
    let lon_pred = start.lon + (end.lon - start.lon) * ratio;

    let d_lat = mid.lat - lat_pred;
    let d_lon = mid.lon - lon_pred;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}
