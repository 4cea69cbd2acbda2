use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

const MARKER: &str = "msg=";
const PAYLOAD_PATTERN: &str = r#"msg="([^"]+)""#;

pub const LOG_RECORD_COLUMNS: [&str; 6] = [
    "timestamp",
    "url",
    "method",
    "status",
    "response_time",
    "body_size",
];

/// One request line emitted by the load generator script.
///
/// Fields are kept as the literal text between commas; typing happens
/// downstream when the per-request table is aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub url: String,
    pub method: String,
    pub status: String,
    pub response_time: String,
    pub body_size: String,
}

impl LogRecord {
    fn from_payload(line: usize, payload: &str) -> Result<Self> {
        let parts: Vec<&str> = payload.split(',').collect();
        match parts.as_slice() {
            [timestamp, url, method, status, response_time, body_size] => Ok(LogRecord {
                timestamp: timestamp.to_string(),
                url: url.to_string(),
                method: method.to_string(),
                status: status.to_string(),
                response_time: response_time.to_string(),
                body_size: body_size.to_string(),
            }),
            _ => Err(Error::FieldCount {
                line,
                expected: LOG_RECORD_COLUMNS.len(),
                found: parts.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractOutcome {
    SourceMissing { source: PathBuf },
    Written { dest: PathBuf, records: usize },
}

pub struct Extractor {
    payload: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            payload: Regex::new(PAYLOAD_PATTERN)?,
        })
    }

    /// Lines without the `msg=` marker yield `None`. A marked line must carry
    /// a quoted payload of exactly six fields.
    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<Option<LogRecord>> {
        if !line.contains(MARKER) {
            return Ok(None);
        }
        let payload = self
            .payload
            .captures(line)
            .and_then(|cap| cap.get(1))
            .ok_or(Error::MissingPayload { line: line_no })?;
        LogRecord::from_payload(line_no, payload.as_str()).map(Some)
    }

    pub fn parse_str(&self, content: &str) -> Result<Vec<LogRecord>> {
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if let Some(record) = self.parse_line(idx + 1, line)? {
                records.push(record);
            }
        }
        Ok(records)
    }
}

pub fn extract(source: &Path) -> Result<Vec<LogRecord>> {
    let content = fs::read_to_string(source)?;
    let records = Extractor::new()?.parse_str(&content)?;
    debug!(
        "Extracted {} records from {} lines of {}",
        records.len(),
        content.lines().count(),
        source.display()
    );
    Ok(records)
}

pub fn write(records: &[LogRecord], dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(dest)?;
    writer.write_record(LOG_RECORD_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Missing source is not an error: the experiment may have been run without
/// per-request logging.
pub fn extract_to_csv(source: &Path, dest: &Path) -> Result<ExtractOutcome> {
    if !source.exists() {
        warn!("File not found: {}", source.display());
        return Ok(ExtractOutcome::SourceMissing {
            source: source.to_path_buf(),
        });
    }
    let records = extract(source)?;
    write(&records, dest)?;
    info!("Wrote {} records to {}", records.len(), dest.display());
    Ok(ExtractOutcome::Written {
        dest: dest.to_path_buf(),
        records: records.len(),
    })
}
