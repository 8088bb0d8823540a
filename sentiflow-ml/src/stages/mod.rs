//! The pipeline stages.
//!
//! Each stage reads the artifacts of the previous one, writes its own and
//! shares nothing else in memory. Every entry point takes a [`StageContext`]
//! and reports through the observer it carries.

pub mod feature_engineering;
pub mod ingestion;
pub mod model_evaluation;
pub mod model_registration;
pub mod model_training;
pub mod preprocessing;

use crate::artifacts::ArtifactLayout;
use crate::error::{StageError, StageResultExt};
use crate::observer::StageObserver;
use sentiflow_core::config::{PipelineConfig, PipelineParams, load_params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DataIngestion,
    Preprocessing,
    FeatureEngineering,
    ModelTraining,
    ModelEvaluation,
    ModelRegistration,
}

impl Stage {
    /// Execution order.
    pub const ALL: [Stage; 6] = [
        Self::DataIngestion,
        Self::Preprocessing,
        Self::FeatureEngineering,
        Self::ModelTraining,
        Self::ModelEvaluation,
        Self::ModelRegistration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DataIngestion => "data ingestion",
            Self::Preprocessing => "data preprocessing",
            Self::FeatureEngineering => "feature engineering",
            Self::ModelTraining => "model training",
            Self::ModelEvaluation => "model evaluation",
            Self::ModelRegistration => "model registration",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a stage needs from outside: where artifacts live, the
/// parameters store, the pipeline settings and the observer.
#[derive(Clone)]
pub struct StageContext {
    pub layout: ArtifactLayout,
    pub params_path: PathBuf,
    pub config: PipelineConfig,
    pub observer: Arc<dyn StageObserver>,
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("layout", &self.layout)
            .field("params_path", &self.params_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StageContext {
    pub fn new(
        workspace: &Path,
        params_path: PathBuf,
        config: PipelineConfig,
        observer: Arc<dyn StageObserver>,
    ) -> Self {
        Self {
            layout: ArtifactLayout::new(workspace, &config.paths),
            params_path,
            config,
            observer,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.layout.root
    }

    /// Read the parameters store; every stage does this on its own.
    pub fn load_params(&self, stage: Stage) -> Result<PipelineParams, StageError> {
        load_params(&self.params_path).in_stage(stage, "load_params")
    }

    pub fn step(&self, stage: Stage, message: &str) {
        self.observer.on_step(stage, message);
    }

    pub fn artifact(&self, stage: Stage, path: &Path) {
        self.observer.on_artifact(stage, path);
    }

    /// Bracket a stage body with start / complete / failed notifications.
    pub async fn observe<T, F>(&self, stage: Stage, body: F) -> Result<T, StageError>
    where
        F: Future<Output = Result<T, StageError>>,
    {
        self.observer.on_stage_start(stage);
        match body.await {
            Ok(value) => {
                self.observer.on_stage_complete(stage);
                Ok(value)
            }
            Err(err) => {
                self.observer.on_stage_failed(stage, &err);
                Err(err)
            }
        }
    }
}
