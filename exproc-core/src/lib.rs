//! Post-processing for load-test experiments: turns the load generator's
//! console log into a per-request table, aligns load generator and server
//! metrics on a shared timestamp axis, and renders comparison charts.

pub mod aggregate;
pub mod charts;
pub mod consts;
mod error;
pub mod extract;
pub mod layout;
pub mod merge;
pub mod pipeline;
pub mod table;

pub use charts::{ChartKind, ChartRenderer, DualAxisChart, PngRenderer};
pub use error::*;
pub use extract::{ExtractOutcome, Extractor, LogRecord};
pub use layout::ExperimentLayout;
pub use merge::{MergedTable, align};
pub use pipeline::{MergeOutcome, MergeReport, RunReport, merge_experiment, run_experiment};
pub use table::{Source, TimeSeriesTable};
