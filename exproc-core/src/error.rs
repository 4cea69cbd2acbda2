use std::path::PathBuf;

use crate::table::Source;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Line {line}: 'msg=' present but no quoted payload")]
    MissingPayload { line: usize },
    #[error("Line {line}: expected {expected} comma-separated fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{table}: missing column '{column}'")]
    MissingColumn { table: String, column: String },
    #[error("{path}:{line}: invalid timestamp '{value}'")]
    InvalidTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("{path}:{line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("{0} table has no rows")]
    EmptyTable(Source),
    #[error("{table} table timestamps not ascending: {previous} followed by {next}")]
    UnsortedTimestamps {
        table: Source,
        previous: i64,
        next: i64,
    },
    #[error("Chart error: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, Error>;
