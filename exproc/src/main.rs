mod cli;
mod report;

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use exproc_core::{ExperimentLayout, PngRenderer, extract, merge_experiment, run_experiment};

use crate::cli::{Commands, OutputFormat};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            match tracing_subscriber::EnvFilter::try_from_default_env() {
                Ok(filter) => filter,
                Err(_) => tracing_subscriber::EnvFilter::new("info"),
            },
        )
        .init();

    let args = cli::Args::parse();
    info!(
        "{} v{}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Some(Commands::Run { exp_dir, render }) => {
            run(&exp_dir, render.renderer(), &render.output)
        }
        Some(Commands::Merge { exp_dir, render }) => {
            merge(&exp_dir, render.renderer(), &render.output)
        }
        Some(Commands::Extract {
            source,
            dest,
            output,
        }) => {
            let pb = spinner(&output, "Extracting per-request records...")?;
            let outcome = extract::extract_to_csv(&source, &dest)
                .with_context(|| format!("Failed to extract {}", source.display()))?;
            finish(pb);
            report::print_extract(&outcome, &output)
        }
        None => {
            let exp_dir = args
                .exp_dir
                .ok_or_else(|| anyhow::anyhow!("Experiment directory is required (EXP_DIR)"))?;
            run(&exp_dir, args.render.renderer(), &args.render.output)
        }
    }
}

fn run(exp_dir: &Path, renderer: PngRenderer, output: &OutputFormat) -> anyhow::Result<()> {
    let layout = ExperimentLayout::new(exp_dir);
    let pb = spinner(output, &format!("Processing {}", exp_dir.display()))?;
    let report = run_experiment(&layout, &renderer)
        .with_context(|| format!("Failed to process experiment {}", exp_dir.display()))?;
    finish(pb);
    report::print_run(&report, output)
}

fn merge(exp_dir: &Path, renderer: PngRenderer, output: &OutputFormat) -> anyhow::Result<()> {
    let layout = ExperimentLayout::new(exp_dir);
    let pb = spinner(output, &format!("Merging {}", exp_dir.display()))?;
    let outcome = merge_experiment(&layout, &renderer)
        .with_context(|| format!("Failed to merge metrics in {}", exp_dir.display()))?;
    finish(pb);
    report::print_merge(&outcome, output)
}

fn spinner(output: &OutputFormat, msg: &str) -> anyhow::Result<Option<ProgressBar>> {
    if *output != OutputFormat::Text {
        return Ok(None);
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.blue} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    Ok(Some(pb))
}

fn finish(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}
