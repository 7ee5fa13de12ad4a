use std::cmp::Reverse;
use std::collections::HashMap;

use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use uom::si::length::meter;

use super::SearchError;
use crate::model::network::{Graph, VertexId};

/// uniform-cost search over the road network from `source` to `target`,
/// accumulating edge distances in meters.
///
/// returns `Ok(None)` when the target is unreachable or every path exceeds
/// the optional cutoff; the cutoff keeps per-query work bounded when the
/// caller only cares about short routes.
pub fn shortest_distance_meters(
    graph: &Graph,
    source: VertexId,
    target: VertexId,
    cutoff_meters: Option<f64>,
) -> Result<Option<f64>, SearchError> {
    if source == target {
        return Ok(Some(0.0));
    }

    let mut frontier: PriorityQueue<VertexId, Reverse<OrderedFloat<f64>>> = PriorityQueue::new();
    let mut traversal_costs: HashMap<VertexId, f64> = HashMap::new();

    traversal_costs.insert(source, 0.0);
    frontier.push(source, Reverse(OrderedFloat(0.0)));

    while let Some((current, Reverse(OrderedFloat(cost)))) = frontier.pop() {
        if current == target {
            return Ok(Some(cost));
        }
        if let Some(cutoff) = cutoff_meters {
            // the frontier pops in cost order, so once the cheapest open
            // vertex exceeds the cutoff no path within bound remains
            if cost > cutoff {
                return Ok(None);
            }
        }

        for edge_id in graph.out_edges_iter(&current) {
            let edge = graph.get_edge(edge_id).map_err(SearchError::from)?;
            let tentative = cost + edge.distance.get::<meter>();
            let existing = traversal_costs
                .get(&edge.dst_vertex_id)
                .copied()
                .unwrap_or(f64::INFINITY);
            if tentative < existing {
                traversal_costs.insert(edge.dst_vertex_id, tentative);
                frontier.push_increase(edge.dst_vertex_id, Reverse(OrderedFloat(tentative)));
            }
        }
    }

    Ok(None)
}
