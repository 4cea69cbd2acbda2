use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::consts::TIMESTAMP_COLUMN;
use crate::error::{Error, Result};
use crate::table::{Source, TimeSeriesTable, format_value};

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub timestamp: i64,
    pub values: Vec<f64>,
}

/// Rows sharing one `timestamp` column. `columns` excludes the timestamp,
/// which is always written first.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    columns: Vec<String>,
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub fn new(columns: Vec<String>, rows: Vec<MergedRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<&str> {
        std::iter::once(TIMESTAMP_COLUMN)
            .chain(self.columns.iter().map(String::as_str))
            .collect()
    }

    pub fn timestamps(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.timestamp).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// `(timestamp, value)` pairs for one metric column.
    pub fn column(&self, name: &str) -> Result<Vec<(i64, f64)>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| Error::MissingColumn {
                table: "merged".to_string(),
                column: name.to_string(),
            })?;
        Ok(self
            .rows
            .iter()
            .map(|r| (r.timestamp, r.values[idx]))
            .collect())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.timestamp.to_string());
            record.extend(row.values.iter().map(|v| format_value(*v)));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlignmentStats {
    pub horizon: i64,
    pub server_duplicates: usize,
    pub loadgen_duplicates: usize,
    pub server_rows: usize,
    pub loadgen_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Alignment {
    pub table: MergedTable,
    pub stats: AlignmentStats,
}

/// The latest timestamp both collectors reached.
pub fn truncation_horizon(a: &TimeSeriesTable, b: &TimeSeriesTable) -> Result<i64> {
    Ok(a.last_timestamp()?.min(b.last_timestamp()?))
}

/// De-duplicates both tables, truncates them to the common horizon and
/// inner-joins them on timestamp. Server columns come first, rows follow the
/// server table's order.
pub fn align(mut server: TimeSeriesTable, mut loadgen: TimeSeriesTable) -> Result<Alignment> {
    let server_duplicates = server.dedup_timestamps();
    let loadgen_duplicates = loadgen.dedup_timestamps();

    let horizon = truncation_horizon(&server, &loadgen)?;
    server.truncate_to(horizon);
    loadgen.truncate_to(horizon);
    debug!(
        "Truncated to horizon {}: server {} rows, loadgen {} rows",
        horizon,
        server.len(),
        loadgen.len()
    );

    let server_rows = server.len();
    let loadgen_rows = loadgen.len();
    let columns = joined_columns(&server, &loadgen);

    let (_, loadgen_data) = loadgen.into_parts();
    let by_ts: HashMap<i64, Vec<f64>> = loadgen_data
        .into_iter()
        .map(|r| (r.timestamp, r.values))
        .collect();

    let (_, server_data) = server.into_parts();
    let rows = server_data
        .into_iter()
        .filter_map(|s| {
            by_ts.get(&s.timestamp).map(|l| {
                let mut values = s.values;
                values.extend_from_slice(l);
                MergedRow {
                    timestamp: s.timestamp,
                    values,
                }
            })
        })
        .collect();

    Ok(Alignment {
        table: MergedTable::new(columns, rows),
        stats: AlignmentStats {
            horizon,
            server_duplicates,
            loadgen_duplicates,
            server_rows,
            loadgen_rows,
        },
    })
}

fn joined_columns(server: &TimeSeriesTable, loadgen: &TimeSeriesTable) -> Vec<String> {
    let server_names: HashSet<&String> = server.columns().iter().collect();
    let loadgen_names: HashSet<&String> = loadgen.columns().iter().collect();
    let qualify = |name: &String, source: Source, other: &HashSet<&String>| {
        if other.contains(name) || name == TIMESTAMP_COLUMN {
            format!("{}_{}", name, source)
        } else {
            name.clone()
        }
    };
    server
        .columns()
        .iter()
        .map(|c| qualify(c, Source::Server, &loadgen_names))
        .chain(
            loadgen
                .columns()
                .iter()
                .map(|c| qualify(c, Source::Loadgen, &server_names)),
        )
        .collect()
}
