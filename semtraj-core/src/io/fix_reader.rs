use std::fs::File;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecordsIntoIter;

use super::IoError;
use crate::model::fix::Fix;

/// names of the CSV columns carrying each fix field. `obj_id` and `road_id`
/// columns are optional in the data; `lat`, `lon`, and `timestamp` must be
/// present.
#[derive(Clone, Debug)]
pub struct ColumnMapping {
    pub lat: String,
    pub lon: String,
    pub timestamp: String,
    pub obj_id: String,
    pub road_id: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            lat: "lat".to_string(),
            lon: "lon".to_string(),
            timestamp: "timestamp".to_string(),
            obj_id: "obj_id".to_string(),
            road_id: "osm_way_id".to_string(),
        }
    }
}

/// reads a delimited file row-by-row as a stream of fixes, simulating a live
/// GPS source. handles both multi-object files (object id column present)
/// and single-object files (all rows assigned `default_obj_id`).
pub struct CsvFixSource {
    records: StringRecordsIntoIter<File>,
    lat_idx: usize,
    lon_idx: usize,
    timestamp_idx: usize,
    obj_id_idx: Option<usize>,
    road_id_idx: Option<usize>,
    default_obj_id: String,
}

impl CsvFixSource {
    /// opens a comma-separated file with the default column names.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        Self::with_mapping(path, ColumnMapping::default(), b',', "unknown_obj")
    }

    pub fn with_mapping<P: AsRef<Path>>(
        path: P,
        mapping: ColumnMapping,
        delimiter: u8,
        default_obj_id: &str,
    ) -> Result<Self, IoError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .from_path(path.as_ref())?;

        let headers = reader.headers()?.clone();
        let column_index = |name: &str| headers.iter().position(|h| h == name);

        let lat_idx = column_index(&mapping.lat)
            .ok_or_else(|| IoError::MissingColumn(mapping.lat.clone()))?;
        let lon_idx = column_index(&mapping.lon)
            .ok_or_else(|| IoError::MissingColumn(mapping.lon.clone()))?;
        let timestamp_idx = column_index(&mapping.timestamp)
            .ok_or_else(|| IoError::MissingColumn(mapping.timestamp.clone()))?;
        let obj_id_idx = column_index(&mapping.obj_id);
        let road_id_idx = column_index(&mapping.road_id);

        Ok(Self {
            records: reader.into_records(),
            lat_idx,
            lon_idx,
            timestamp_idx,
            obj_id_idx,
            road_id_idx,
            default_obj_id: default_obj_id.to_string(),
        })
    }

    fn parse_record(&self, record: &csv::StringRecord) -> Result<Fix, IoError> {
        let lat = parse_f64("lat", record.get(self.lat_idx).unwrap_or(""))?;
        let lon = parse_f64("lon", record.get(self.lon_idx).unwrap_or(""))?;
        let timestamp = parse_timestamp(record.get(self.timestamp_idx).unwrap_or(""))?;

        let obj_id = self
            .obj_id_idx
            .and_then(|idx| record.get(idx))
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_obj_id)
            .to_string();
        let road_id = self
            .road_id_idx
            .and_then(|idx| record.get(idx))
            .filter(|v| !v.is_empty())
            .map(String::from);

        Ok(Fix {
            lat,
            lon,
            timestamp,
            obj_id,
            road_id,
        })
    }
}

impl Iterator for CsvFixSource {
    type Item = Result<Fix, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(record) => Some(self.parse_record(&record)),
            Err(e) => Some(Err(IoError::from(e))),
        }
    }
}

fn parse_f64(field: &'static str, value: &str) -> Result<f64, IoError> {
    value.parse::<f64>().map_err(|e| IoError::ParseError {
        field,
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// accepts RFC 3339 timestamps or the bare `YYYY-mm-dd HH:MM:SS` form,
/// which is read as UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, IoError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| IoError::ParseError {
            field: "timestamp",
            value: value.to_string(),
            message: e.to_string(),
        })
}
