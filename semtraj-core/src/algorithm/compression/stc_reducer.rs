use crate::model::fix::Fix;

/// semantic trajectory compression: reduces a map-matched Move to the fixes
/// that mark a change of road, plus the origin and destination.
#[derive(Debug, Default)]
pub struct StcReducer;

impl StcReducer {
    pub fn new() -> Self {
        Self
    }

    /// keeps the first fix, every fix whose `road_id` differs from its
    /// predecessor's, and the last fix (appended only when distinct from the
    /// fix already emitted last). inputs with zero or one fix are returned
    /// unchanged.
    pub fn reduce(&self, points: &[Fix]) -> Vec<Fix> {
        if points.len() <= 1 {
            return points.to_vec();
        }

        let mut compressed: Vec<Fix> = Vec::new();
        let mut current_road: Option<&Option<String>> = None;

        for (idx, point) in points.iter().enumerate() {
            if idx == 0 {
                compressed.push(point.clone());
                current_road = Some(&point.road_id);
                continue;
            }
            if idx == points.len() - 1 {
                if compressed.last() != Some(point) {
                    compressed.push(point.clone());
                }
                continue;
            }
            if Some(&point.road_id) != current_road {
                compressed.push(point.clone());
                current_road = Some(&point.road_id);
            }
        }

        compressed
    }
}
