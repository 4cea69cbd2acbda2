use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate;
use crate::charts::{ChartKind, ChartRenderer, DualAxisChart};
use crate::error::Result;
use crate::extract::{self, ExtractOutcome};
use crate::layout::ExperimentLayout;
use crate::merge::{self, AlignmentStats, MergedTable};
use crate::table::{Source, TimeSeriesTable};

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub path: PathBuf,
    pub groups: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub merged_path: PathBuf,
    pub merged_rows: usize,
    pub alignment: AlignmentStats,
    pub aggregated: Option<AggregateReport>,
    pub charts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    MissingInputs { missing: Vec<PathBuf> },
    Completed(MergeReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub experiment: PathBuf,
    pub extract: ExtractOutcome,
    pub merge: MergeOutcome,
}

/// Extracts the per-request log, then merges the collector metrics.
pub fn run_experiment(layout: &ExperimentLayout, renderer: &dyn ChartRenderer) -> Result<RunReport> {
    let extract = extract::extract_to_csv(&layout.loadgen_log(), &layout.per_request_results())?;
    let merge = merge_experiment(layout, renderer)?;
    Ok(RunReport {
        experiment: layout.root().to_path_buf(),
        extract,
        merge,
    })
}

pub fn merge_experiment(
    layout: &ExperimentLayout,
    renderer: &dyn ChartRenderer,
) -> Result<MergeOutcome> {
    let loadgen_path = layout.loadgen_results();
    let server_path = layout.server_results();

    let missing: Vec<PathBuf> = [&loadgen_path, &server_path]
        .into_iter()
        .filter(|p| !p.exists())
        .cloned()
        .collect();
    if !missing.is_empty() {
        for path in &missing {
            warn!("File not found: {}", path.display());
        }
        return Ok(MergeOutcome::MissingInputs { missing });
    }

    let loadgen = TimeSeriesTable::load(Source::Loadgen, &loadgen_path)?;
    let server = TimeSeriesTable::load(Source::Server, &server_path)?;
    let alignment = merge::align(server, loadgen)?;
    let merged = alignment.table;
    debug!(
        "Aligned at horizon {} ({} server, {} loadgen duplicate rows dropped)",
        alignment.stats.horizon,
        alignment.stats.server_duplicates,
        alignment.stats.loadgen_duplicates
    );
    if merged.is_empty() {
        warn!(
            "No common timestamps up to {} in {} and {}",
            alignment.stats.horizon,
            server_path.display(),
            loadgen_path.display()
        );
    }

    fs::create_dir_all(layout.data_dir())?;
    fs::create_dir_all(layout.plots_dir())?;

    let merged_path = layout.merged_results();
    merged.write_csv(&merged_path)?;
    info!("Wrote {} merged rows to {}", merged.len(), merged_path.display());

    let mut charts = render_all(layout, renderer, &ChartKind::MERGED, &merged)?;

    let per_request_path = layout.per_request_results();
    let aggregated = if per_request_path.exists() {
        let samples = aggregate::load_samples(&per_request_path)?;
        let stats = aggregate::aggregate(&samples);
        let joined = aggregate::join(&stats, &merged);

        let path = layout.per_request_agg();
        joined.write_csv(&path)?;
        info!(
            "Wrote {} aggregated rows ({} samples) to {}",
            joined.len(),
            samples.len(),
            path.display()
        );

        charts.extend(render_all(layout, renderer, &ChartKind::PER_REQUEST, &joined)?);
        Some(AggregateReport {
            path,
            groups: stats.len(),
            rows: joined.len(),
        })
    } else {
        debug!("No per-request results at {}", per_request_path.display());
        None
    };

    Ok(MergeOutcome::Completed(MergeReport {
        merged_path,
        merged_rows: merged.len(),
        alignment: alignment.stats,
        aggregated,
        charts,
    }))
}

fn render_all(
    layout: &ExperimentLayout,
    renderer: &dyn ChartRenderer,
    kinds: &[ChartKind],
    table: &MergedTable,
) -> Result<Vec<PathBuf>> {
    kinds
        .iter()
        .map(|kind| {
            let chart = DualAxisChart::from_table(*kind, table)?;
            let dest = layout.plot(*kind);
            renderer.render(&chart, &dest)?;
            debug!("Rendered {}", dest.display());
            Ok(dest)
        })
        .collect()
}
