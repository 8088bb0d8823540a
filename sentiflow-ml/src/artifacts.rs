//! File layout of the artifacts passed between stages.

use sentiflow_core::config::PathsConfig;
use std::path::{Path, PathBuf};

/// Fully resolved artifact paths for one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub root: PathBuf,
    pub train_raw: PathBuf,
    pub test_raw: PathBuf,
    pub train_processed: PathBuf,
    pub test_processed: PathBuf,
    pub train_bow: PathBuf,
    pub test_bow: PathBuf,
    pub model: PathBuf,
    pub metrics: PathBuf,
    pub experiment_info: PathBuf,
}

impl ArtifactLayout {
    pub fn new(root: &Path, paths: &PathsConfig) -> Self {
        let raw = root.join(&paths.raw_dir);
        let interim = root.join(&paths.interim_dir);
        let processed = root.join(&paths.processed_dir);
        let models = root.join(&paths.models_dir);
        let reports = root.join(&paths.reports_dir);
        Self {
            root: root.to_path_buf(),
            train_raw: raw.join("train_raw.csv"),
            test_raw: raw.join("test_raw.csv"),
            train_processed: interim.join("train_processed.csv"),
            test_processed: interim.join("test_processed.csv"),
            train_bow: processed.join("train_bow.csv"),
            test_bow: processed.join("test_bow.csv"),
            model: models.join("model.json"),
            metrics: reports.join("metrics.json"),
            experiment_info: reports.join("experiment_info.json"),
        }
    }

    /// Layout with the default directory names.
    pub fn with_defaults(root: &Path) -> Self {
        Self::new(root, &PathsConfig::default())
    }
}
