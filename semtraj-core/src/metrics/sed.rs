use crate::model::fix::Fix;
use crate::util::geo::METERS_PER_DEGREE;

/// aggregate SED error statistics over a compressed trajectory, in meters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SedStats {
    pub average: f64,
    pub max: f64,
    pub rmse: f64,
    pub errors: Vec<f64>,
}

/// planar distance between two fixes via the latitude-local linear degree
/// factors, in meters.
fn planar_distance_meters(a: &Fix, b: &Fix) -> f64 {
    let avg_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let d_lat_m = (a.lat - b.lat) * METERS_PER_DEGREE;
    let d_lon_m = (a.lon - b.lon) * METERS_PER_DEGREE * avg_lat.cos();
    (d_lat_m * d_lat_m + d_lon_m * d_lon_m).sqrt()
}

/// synchronised euclidean distance error of one original fix against the
/// anchor pair (start, end): the planar distance in meters between the fix
/// and the linear temporal interpolation of the anchors at the fix's
/// timestamp. anchors sharing a timestamp degrade to the plain distance from
/// the fix to the start anchor.
pub fn calculate_sed_error(original: &Fix, start: &Fix, end: &Fix) -> f64 {
    let t_orig = original.timestamp.timestamp_millis() as f64;
    let t_start = start.timestamp.timestamp_millis() as f64;
    let t_end = end.timestamp.timestamp_millis() as f64;

    if t_start == t_end {
        return planar_distance_meters(original, start);
    }

    let ratio = (t_orig - t_start) / (t_end - t_start);
    let pred_lat = start.lat + (end.lat - start.lat) * ratio;
    let pred_lon = start.lon + (end.lon - start.lon) * ratio;

    let avg_lat = ((start.lat + end.lat) / 2.0).to_radians();
    let d_lat_m = (original.lat - pred_lat) * METERS_PER_DEGREE;
    let d_lon_m = (original.lon - pred_lon) * METERS_PER_DEGREE * avg_lat.cos();
    (d_lat_m * d_lat_m + d_lon_m * d_lon_m).sqrt()
}

/// SED statistics of a compressed trajectory against its original.
///
/// the compressed sequence is assumed to be a time-sorted subsequence of the
/// original; each original fix is scored against the compressed segment
/// covering its timestamp. fixes falling before the first or after the last
/// compressed anchor are scored by plain distance to that anchor.
pub fn calculate_sed_stats(original: &[Fix], compressed: &[Fix]) -> SedStats {
    if original.is_empty() || compressed.is_empty() {
        return SedStats::default();
    }

    let mut errors: Vec<f64> = Vec::with_capacity(original.len());
    let mut comp_idx = 0_usize;

    for p in original {
        while comp_idx < compressed.len() - 1
            && p.timestamp > compressed[comp_idx + 1].timestamp
        {
            comp_idx += 1;
        }

        if comp_idx >= compressed.len() - 1 {
            errors.push(planar_distance_meters(p, &compressed[compressed.len() - 1]));
            continue;
        }

        let start = &compressed[comp_idx];
        let end = &compressed[comp_idx + 1];
        if p.timestamp < start.timestamp {
            errors.push(planar_distance_meters(p, start));
            continue;
        }
        errors.push(calculate_sed_error(p, start, end));
    }

    let n = errors.len() as f64;
    let average = errors.iter().sum::<f64>() / n;
    let max = errors.iter().cloned().fold(0.0, f64::max);
    let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
    SedStats {
        average,
        max,
        rmse: mse.sqrt(),
        errors,
    }
}
