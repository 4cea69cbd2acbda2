use std::path::{Path, PathBuf};

use crate::charts::ChartKind;
use crate::consts;

/// Fixed file locations inside one experiment directory.
#[derive(Debug, Clone)]
pub struct ExperimentLayout {
    root: PathBuf,
}

impl ExperimentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn metrics(&self) -> PathBuf {
        self.root.join(consts::METRICS_DIR)
    }

    pub fn loadgen_dir(&self) -> PathBuf {
        self.metrics().join(consts::LOADGEN_DIR)
    }

    pub fn loadgen_results(&self) -> PathBuf {
        self.loadgen_dir().join(consts::RESULTS_FILE)
    }

    pub fn server_results(&self) -> PathBuf {
        self.metrics()
            .join(consts::SERVER_DIR)
            .join(consts::RESULTS_FILE)
    }

    pub fn loadgen_log(&self) -> PathBuf {
        self.loadgen_dir().join(consts::LOADGEN_LOG_FILE)
    }

    pub fn per_request_results(&self) -> PathBuf {
        self.loadgen_dir().join(consts::PER_REQUEST_FILE)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.metrics()
            .join(consts::PROCESSED_DIR)
            .join(consts::DATA_DIR)
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.metrics()
            .join(consts::PROCESSED_DIR)
            .join(consts::PLOTS_DIR)
    }

    pub fn merged_results(&self) -> PathBuf {
        self.data_dir().join(consts::MERGED_FILE)
    }

    pub fn per_request_agg(&self) -> PathBuf {
        self.data_dir().join(consts::PER_REQUEST_AGG_FILE)
    }

    pub fn plot(&self, kind: ChartKind) -> PathBuf {
        self.plots_dir().join(kind.file_name())
    }
}
