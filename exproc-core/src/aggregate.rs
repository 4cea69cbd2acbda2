use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::consts::{RESPONSE_TIME_COLUMN, TIMESTAMP_COLUMN};
use crate::error::{Error, Result};
use crate::merge::{MergedRow, MergedTable};
use crate::table::parse_timestamp;

pub const AGGREGATE_COLUMNS: [&str; 4] = [
    "response_time_mean",
    "response_time_std",
    "response_time_min",
    "response_time_max",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub response_time: f64,
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    timestamp: String,
    response_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseTimeStats {
    pub timestamp: i64,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN with fewer than two samples.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    read_samples(File::open(path)?, path)
}

pub fn read_samples<R: Read>(reader: R, origin: &Path) -> Result<Vec<Sample>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    for required in [TIMESTAMP_COLUMN, RESPONSE_TIME_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(Error::MissingColumn {
                table: origin.display().to_string(),
                column: required.to_string(),
            });
        }
    }

    let mut samples = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: SampleRow = record.deserialize(Some(&headers))?;
        let timestamp =
            parse_timestamp(&row.timestamp).ok_or_else(|| Error::InvalidTimestamp {
                path: origin.to_path_buf(),
                line,
                value: row.timestamp.clone(),
            })?;
        samples.push(Sample {
            timestamp,
            response_time: row.response_time,
        });
    }
    Ok(samples)
}

/// Groups samples by timestamp, ascending.
pub fn aggregate(samples: &[Sample]) -> Vec<ResponseTimeStats> {
    let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for s in samples {
        groups.entry(s.timestamp).or_default().push(s.response_time);
    }
    groups
        .into_iter()
        .map(|(timestamp, values)| summarize(timestamp, &values))
        .collect()
}

fn summarize(timestamp: i64, values: &[f64]) -> ResponseTimeStats {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    ResponseTimeStats {
        timestamp,
        count,
        mean,
        std,
        min,
        max,
    }
}

/// Inner join of the per-timestamp stats with the merged metrics. Stats
/// columns come first, rows follow the stats order.
pub fn join(stats: &[ResponseTimeStats], merged: &MergedTable) -> MergedTable {
    let by_ts: HashMap<i64, &MergedRow> = merged.rows().iter().map(|r| (r.timestamp, r)).collect();

    let columns = AGGREGATE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(merged.columns().iter().cloned())
        .collect();

    let rows = stats
        .iter()
        .filter_map(|s| {
            by_ts.get(&s.timestamp).map(|m| {
                let mut values = vec![s.mean, s.std, s.min, s.max];
                values.extend_from_slice(&m.values);
                MergedRow {
                    timestamp: s.timestamp,
                    values,
                }
            })
        })
        .collect();

    MergedTable::new(columns, rows)
}
