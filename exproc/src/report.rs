use std::path::Path;

use console::style;
use serde::Serialize;

use exproc_core::{ExtractOutcome, MergeOutcome, RunReport};

use crate::cli::OutputFormat;

fn ok_line(msg: impl AsRef<str>) -> String {
    format!("{} {}", style("✔").green(), msg.as_ref())
}

fn skip_line(msg: impl AsRef<str>) -> String {
    format!("{} {}", style("!").yellow(), msg.as_ref())
}

fn path(p: &Path) -> String {
    style(p.display()).cyan().to_string()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn extract_lines(outcome: &ExtractOutcome) -> Vec<String> {
    match outcome {
        ExtractOutcome::SourceMissing { source } => {
            vec![skip_line(format!("File not found: {}", path(source)))]
        }
        ExtractOutcome::Written { dest, records } => vec![ok_line(format!(
            "Extracted {} records to {}",
            style(records).bold(),
            path(dest)
        ))],
    }
}

pub fn merge_lines(outcome: &MergeOutcome) -> Vec<String> {
    match outcome {
        MergeOutcome::MissingInputs { missing } => missing
            .iter()
            .map(|p| skip_line(format!("File not found: {}", path(p))))
            .collect(),
        MergeOutcome::Completed(report) => {
            let stats = &report.alignment;
            let mut lines = vec![ok_line(format!(
                "Merged {} rows up to timestamp {} to {}",
                style(report.merged_rows).bold(),
                stats.horizon,
                path(&report.merged_path)
            ))];
            if stats.server_duplicates + stats.loadgen_duplicates > 0 {
                lines.push(format!(
                    "  dropped duplicate timestamps: server {}, loadgen {}",
                    stats.server_duplicates, stats.loadgen_duplicates
                ));
            }
            if let Some(agg) = &report.aggregated {
                lines.push(ok_line(format!(
                    "Aggregated {} response-time groups, {} joined rows to {}",
                    agg.groups,
                    style(agg.rows).bold(),
                    path(&agg.path)
                )));
            }
            lines.extend(report.charts.iter().map(|c| ok_line(format!("Chart {}", path(c)))));
            lines
        }
    }
}

pub fn print_extract(outcome: &ExtractOutcome, output: &OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => print_json(outcome),
        OutputFormat::Text => {
            extract_lines(outcome).iter().for_each(|l| println!("{}", l));
            Ok(())
        }
    }
}

pub fn print_merge(outcome: &MergeOutcome, output: &OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => print_json(outcome),
        OutputFormat::Text => {
            merge_lines(outcome).iter().for_each(|l| println!("{}", l));
            Ok(())
        }
    }
}

pub fn print_run(report: &RunReport, output: &OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => print_json(report),
        OutputFormat::Text => {
            println!("Experiment {}", path(&report.experiment));
            extract_lines(&report.extract)
                .iter()
                .chain(merge_lines(&report.merge).iter())
                .for_each(|l| println!("{}", l));
            Ok(())
        }
    }
}
