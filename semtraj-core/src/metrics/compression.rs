use crate::model::fix::Fix;

/// point-count compression ratio, e.g. 10.0 for 10:1 compression. an empty
/// compressed sequence yields 1.0.
pub fn compression_ratio(original: &[Fix], compressed: &[Fix]) -> f64 {
    if compressed.is_empty() {
        return 1.0;
    }
    original.len() as f64 / compressed.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn fixes(n: usize) -> Vec<Fix> {
        let t0 = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        (0..n)
            .map(|i| Fix::new(0.0, 0.0, t0 + TimeDelta::minutes(i as i64), "obj1"))
            .collect()
    }

    #[test]
    fn test_ratio() {
        assert_eq!(compression_ratio(&fixes(10), &fixes(2)), 5.0);
    }

    #[test]
    fn test_empty_compressed_yields_one() {
        assert_eq!(compression_ratio(&fixes(10), &[]), 1.0);
    }
}
