//! Experiment tracking and model registry.
//!
//! Stages talk to a [`TrackingStore`]; which one is decided once, by
//! [`open_store`], from the `tracking` section of the pipeline settings.

pub mod local;
pub mod mlflow;

pub use local::LocalTrackingStore;
pub use mlflow::MlflowTrackingStore;

use crate::error::MlError;
use crate::training::artifact::MODEL_KIND;
use async_trait::async_trait;
use chrono::Utc;
use sentiflow_core::config::{TrackingBackend, TrackingConfig, TrackingCredentials};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Identifies one tracked run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: String,
    pub experiment_id: String,
}

/// Terminal (or current) state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
    Killed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Finished => "FINISHED",
            Self::Failed => "FAILED",
            Self::Killed => "KILLED",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `runs:/<run_id>/<path>` model reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUri {
    pub run_id: String,
    pub path: String,
}

impl ModelUri {
    pub fn new(run_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            path: path.into(),
        }
    }

    pub fn parse(uri: &str) -> Result<Self, MlError> {
        let rest = uri
            .strip_prefix("runs:/")
            .ok_or_else(|| MlError::invalid_input(format!("not a runs:/ model URI: {uri}")))?;
        match rest.split_once('/') {
            Some((run_id, path)) if !run_id.is_empty() && !path.is_empty() => {
                Ok(Self::new(run_id, path))
            }
            _ => Err(MlError::invalid_input(format!(
                "model URI must be runs:/<run_id>/<path>, got {uri}"
            ))),
        }
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runs:/{}/{}", self.run_id, self.path)
    }
}

/// Name of the model descriptor logged next to a model file.
pub const MLMODEL_FILE: &str = "MLmodel";

/// Flavor name under which the model file is described.
pub const MODEL_FLAVOR: &str = "sentiflow";

/// The `MLmodel` descriptor that makes a logged directory a model.
///
/// Serialized as JSON, which YAML readers accept unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub artifact_path: String,
    pub run_id: String,
    pub model_uuid: String,
    pub utc_time_created: String,
    pub flavors: BTreeMap<String, Value>,
}

impl ModelDescriptor {
    pub fn new(run: &RunHandle, artifact_path: &str, model_file: &str) -> Self {
        let flavor = json!({
            "model_file": model_file,
            "model_kind": MODEL_KIND,
            "sentiflow_version": env!("CARGO_PKG_VERSION"),
        });
        Self {
            artifact_path: artifact_path.trim_matches('/').to_string(),
            run_id: run.run_id.clone(),
            model_uuid: uuid::Uuid::new_v4().simple().to_string(),
            utc_time_created: Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            flavors: BTreeMap::from([(MODEL_FLAVOR.to_string(), flavor)]),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MlError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

/// An experiment tracker with a model registry.
///
/// Every call returns a `Result`; callers decide what a failure means.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Start a run in `experiment`, creating the experiment if needed.
    async fn start_run(&self, experiment: &str) -> Result<RunHandle, MlError>;

    async fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> Result<(), MlError>;

    async fn log_param(&self, run: &RunHandle, key: &str, value: &str) -> Result<(), MlError>;

    /// Store a serialized model under `artifact_path` in the run, together
    /// with its [`ModelDescriptor`].
    async fn log_model(
        &self,
        run: &RunHandle,
        model_file: &Path,
        artifact_path: &str,
    ) -> Result<(), MlError>;

    /// Store a file at the root of the run's artifacts.
    async fn log_artifact(&self, run: &RunHandle, file: &Path) -> Result<(), MlError>;

    async fn end_run(&self, run: &RunHandle, status: RunStatus) -> Result<(), MlError>;

    /// Register the model at `model_uri` under `name`; returns the new version.
    async fn register_model(&self, model_uri: &str, name: &str) -> Result<String, MlError>;

    async fn transition_stage(&self, name: &str, version: &str, stage: &str)
    -> Result<(), MlError>;

    async fn log_metrics(&self, run: &RunHandle, metrics: &[(&str, f64)]) -> Result<(), MlError> {
        for (key, value) in metrics {
            self.log_metric(run, key, *value).await?;
        }
        Ok(())
    }

    async fn log_params(
        &self,
        run: &RunHandle,
        params: &BTreeMap<String, String>,
    ) -> Result<(), MlError> {
        for (key, value) in params {
            self.log_param(run, key, value).await?;
        }
        Ok(())
    }
}

/// Open the tracker selected by `config`.
///
/// `credentials` are required by the remote backend and ignored by the local
/// one. Relative local directories resolve against `workspace`.
pub fn open_store(
    config: &TrackingConfig,
    credentials: Option<TrackingCredentials>,
    workspace: &Path,
) -> Result<Box<dyn TrackingStore>, MlError> {
    match config.backend {
        TrackingBackend::Local => {
            let root = workspace.join(&config.local_dir);
            tracing::debug!(root = %root.display(), "Using local tracking store");
            Ok(Box::new(LocalTrackingStore::new(root)))
        }
        TrackingBackend::Mlflow => {
            let credentials = credentials.ok_or_else(|| {
                MlError::tracking(format!(
                    "the mlflow backend needs credentials from {}",
                    config.token_env
                ))
            })?;
            tracing::debug!(uri = %config.tracking_uri, "Using MLflow tracking server");
            Ok(Box::new(MlflowTrackingStore::new(
                &config.tracking_uri,
                Some(credentials),
            )?))
        }
    }
}
