use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::consts;
use crate::error::{Error, Result};

/// The collector that produced a results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Loadgen,
    Server,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Loadgen => "loadgen",
            Source::Server => "server",
        }
    }

    pub fn key_header(self) -> &'static str {
        match self {
            Source::Loadgen => consts::LOADGEN_KEY_HEADER,
            Source::Server => consts::SERVER_KEY_HEADER,
        }
    }

    fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Source::Loadgen => consts::LOADGEN_COLUMNS,
            Source::Server => consts::SERVER_COLUMNS,
        }
    }

    /// Canonical name for a collector header; unknown headers pass through.
    pub fn canonical<'a>(self, header: &'a str) -> &'a str {
        self.columns()
            .iter()
            .find(|(raw, _)| *raw == header)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(header)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub timestamp: i64,
    pub values: Vec<f64>,
}

/// A collector's results keyed by timestamp. `columns` names the metric
/// values of each row, canonicalized, without the key column.
#[derive(Debug, Clone)]
pub struct TimeSeriesTable {
    source: Source,
    columns: Vec<String>,
    rows: Vec<TimeSeriesRow>,
}

impl TimeSeriesTable {
    pub fn load(source: Source, path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::read(source, file, path)
    }

    pub fn from_reader<R: Read>(source: Source, reader: R) -> Result<Self> {
        Self::read(source, reader, Path::new(source.as_str()))
    }

    fn read<R: Read>(source: Source, reader: R, origin: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let key_idx = headers
            .iter()
            .position(|h| h == source.key_header())
            .ok_or_else(|| Error::MissingColumn {
                table: origin.display().to_string(),
                column: source.key_header().to_string(),
            })?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != key_idx)
            .map(|(_, h)| source.canonical(h).to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw_ts = record.get(key_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| Error::InvalidTimestamp {
                path: origin.to_path_buf(),
                line,
                value: raw_ts.to_string(),
            })?;

            let mut values = Vec::with_capacity(columns.len());
            for (idx, cell) in record.iter().enumerate() {
                if idx == key_idx {
                    continue;
                }
                let value = parse_value(cell).ok_or_else(|| Error::InvalidNumber {
                    path: origin.to_path_buf(),
                    line,
                    column: headers.get(idx).unwrap_or_default().to_string(),
                    value: cell.to_string(),
                })?;
                values.push(value);
            }
            rows.push(TimeSeriesRow { timestamp, values });
        }

        debug!(
            "Loaded {} table from {}: {} rows, columns {:?}",
            source,
            origin.display(),
            rows.len(),
            columns
        );
        Ok(Self {
            source,
            columns,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<TimeSeriesRow>) {
        (self.columns, self.rows)
    }

    /// Keeps the first row for each timestamp. Returns the number of rows dropped.
    pub fn dedup_timestamps(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::with_capacity(before);
        self.rows.retain(|row| seen.insert(row.timestamp));
        before - self.rows.len()
    }

    /// The final timestamp of the table. Collectors append in time order, so
    /// the key must be strictly ascending once duplicates are removed.
    pub fn last_timestamp(&self) -> Result<i64> {
        for pair in self.rows.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(Error::UnsortedTimestamps {
                    table: self.source,
                    previous: pair[0].timestamp,
                    next: pair[1].timestamp,
                });
            }
        }
        self.rows
            .last()
            .map(|row| row.timestamp)
            .ok_or(Error::EmptyTable(self.source))
    }

    pub fn truncate_to(&mut self, horizon: i64) {
        self.rows.retain(|row| row.timestamp <= horizon);
    }
}

/// Accepts `12` and `12.0`, rejects anything with a fractional part.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Empty cells are missing samples.
pub fn parse_value(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        Some(f64::NAN)
    } else {
        s.parse::<f64>().ok()
    }
}

/// Inverse of [`parse_value`] for CSV output.
pub fn format_value(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}
