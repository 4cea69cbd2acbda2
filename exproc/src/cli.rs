use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use exproc_core::consts::{DEFAULT_PLOT_HEIGHT, DEFAULT_PLOT_WIDTH};
use exproc_core::PngRenderer;

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    /// Experiment directory (runs extraction and merge)
    #[arg(env = "EXP_DIR")]
    pub exp_dir: Option<PathBuf>,

    #[command(flatten)]
    pub render: RenderArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RenderArgs {
    /// Chart width in pixels
    #[arg(long, env = "PLOT_WIDTH", default_value_t = DEFAULT_PLOT_WIDTH)]
    pub width: u32,

    /// Chart height in pixels
    #[arg(long, env = "PLOT_HEIGHT", default_value_t = DEFAULT_PLOT_HEIGHT)]
    pub height: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl RenderArgs {
    pub fn renderer(&self) -> PngRenderer {
        PngRenderer {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract the per-request log, then merge metrics and render charts
    Run {
        /// Experiment directory
        exp_dir: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Extract per-request records from a load generator log
    Extract {
        /// Load generator console log
        source: PathBuf,

        /// Destination CSV
        dest: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Merge load generator and server metrics and render charts
    Merge {
        /// Experiment directory
        exp_dir: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },
}
