//! Filesystem tracking store.
//!
//! Layout under the root directory:
//!
//! ```text
//! experiments.json                      experiment index
//! <experiment_id>/<run_id>/run.json     run record (status, metrics, params)
//! <experiment_id>/<run_id>/artifacts/   logged files
//! models.json                           model registry
//! ```

use crate::error::MlError;
use crate::tracking::{
    MLMODEL_FILE, ModelDescriptor, ModelUri, RunHandle, RunStatus, TrackingStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentiflow_core::persistence;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const EXPERIMENTS_FILE: &str = "experiments.json";
const MODELS_FILE: &str = "models.json";
const RUN_FILE: &str = "run.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ExperimentIndex {
    experiments: Vec<ExperimentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExperimentRecord {
    experiment_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

/// A run as stored in `run.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub experiment_id: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub metrics: BTreeMap<String, f64>,
    pub params: BTreeMap<String, String>,
    pub artifacts: Vec<ArtifactRecord>,
}

/// A logged file with its content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Path relative to the run's `artifacts/` directory.
    pub path: String,
    pub sha256: String,
    pub size_bytes: u64,
}

/// The model registry as stored in `models.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalRegistry {
    pub models: Vec<RegisteredModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredModel {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub versions: Vec<ModelVersionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVersionRecord {
    pub version: u32,
    pub source: String,
    pub run_id: String,
    pub stage: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalRegistry {
    pub fn find(&self, name: &str) -> Option<&RegisteredModel> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn latest_version(&self, name: &str) -> Option<&ModelVersionRecord> {
        self.find(name)?.versions.iter().max_by_key(|v| v.version)
    }
}

/// Tracking store backed by JSON files in a local directory.
#[derive(Debug, Clone)]
pub struct LocalTrackingStore {
    root: PathBuf,
}

impl LocalTrackingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run_dir(&self, run: &RunHandle) -> PathBuf {
        self.root.join(&run.experiment_id).join(&run.run_id)
    }

    /// Read a run record.
    pub fn load_run(&self, run: &RunHandle) -> Result<RunRecord, MlError> {
        let path = self.run_dir(run).join(RUN_FILE);
        persistence::load_json_opt(&path)?
            .ok_or_else(|| MlError::not_found(format!("run {} not found", run.run_id)))
    }

    fn save_run(&self, record: &RunRecord) -> Result<(), MlError> {
        let handle = RunHandle {
            run_id: record.run_id.clone(),
            experiment_id: record.experiment_id.clone(),
        };
        persistence::atomic_write_json(&self.run_dir(&handle).join(RUN_FILE), record)?;
        Ok(())
    }

    fn update_run<F>(&self, run: &RunHandle, f: F) -> Result<(), MlError>
    where
        F: FnOnce(&mut RunRecord) -> Result<(), MlError>,
    {
        let mut record = self.load_run(run)?;
        if record.status != RunStatus::Running {
            return Err(MlError::tracking(format!(
                "run {} is already {}",
                run.run_id, record.status
            )));
        }
        f(&mut record)?;
        self.save_run(&record)
    }

    fn load_experiments(&self) -> Result<ExperimentIndex, MlError> {
        Ok(persistence::load_json_opt(&self.root.join(EXPERIMENTS_FILE))?.unwrap_or_default())
    }

    /// Read the model registry. Empty when nothing was registered yet.
    pub fn load_registry(&self) -> Result<LocalRegistry, MlError> {
        Ok(persistence::load_json_opt(&self.root.join(MODELS_FILE))?.unwrap_or_default())
    }

    fn save_registry(&self, registry: &LocalRegistry) -> Result<(), MlError> {
        persistence::atomic_write_json(&self.root.join(MODELS_FILE), registry)?;
        Ok(())
    }

    fn experiment_id(&self, name: &str) -> Result<String, MlError> {
        let mut index = self.load_experiments()?;
        if let Some(existing) = index.experiments.iter().find(|e| e.name == name) {
            return Ok(existing.experiment_id.clone());
        }
        let experiment_id = index.experiments.len().to_string();
        index.experiments.push(ExperimentRecord {
            experiment_id: experiment_id.clone(),
            name: name.to_string(),
            created_at: Utc::now(),
        });
        persistence::atomic_write_json(&self.root.join(EXPERIMENTS_FILE), &index)?;
        tracing::debug!(experiment = name, experiment_id, "Created local experiment");
        Ok(experiment_id)
    }

    /// Find which experiment a run id belongs to.
    fn locate_run(&self, run_id: &str) -> Result<RunHandle, MlError> {
        self.load_experiments()?
            .experiments
            .into_iter()
            .map(|e| RunHandle {
                run_id: run_id.to_string(),
                experiment_id: e.experiment_id,
            })
            .find(|handle| self.run_dir(handle).join(RUN_FILE).exists())
            .ok_or_else(|| MlError::not_found(format!("run {run_id} not found")))
    }

    /// Copy `file` into the run's artifacts under `dest`.
    async fn copy_artifact(&self, run: &RunHandle, file: &Path, dest: &str) -> Result<(), MlError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            MlError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read artifact {}: {e}", file.display()),
            ))
        })?;
        self.store_artifact(run, dest, &bytes)
    }

    /// Write `bytes` into the run's artifacts under `dest` and record its digest.
    fn store_artifact(&self, run: &RunHandle, dest: &str, bytes: &[u8]) -> Result<(), MlError> {
        let digest = hex(&Sha256::digest(bytes));
        let size_bytes = bytes.len() as u64;

        self.update_run(run, |record| {
            let target = self.run_dir(run).join("artifacts").join(dest);
            persistence::atomic_write(&target, bytes)?;
            record.artifacts.retain(|a| a.path != dest);
            record.artifacts.push(ArtifactRecord {
                path: dest.to_string(),
                sha256: digest,
                size_bytes,
            });
            Ok(())
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn file_name(path: &Path) -> Result<String, MlError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MlError::invalid_input(format!("{} has no file name", path.display())))
}

#[async_trait]
impl TrackingStore for LocalTrackingStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn start_run(&self, experiment: &str) -> Result<RunHandle, MlError> {
        let handle = RunHandle {
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            experiment_id: self.experiment_id(experiment)?,
        };
        self.save_run(&RunRecord {
            run_id: handle.run_id.clone(),
            experiment_id: handle.experiment_id.clone(),
            status: RunStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            metrics: BTreeMap::new(),
            params: BTreeMap::new(),
            artifacts: Vec::new(),
        })?;
        Ok(handle)
    }

    async fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> Result<(), MlError> {
        if !value.is_finite() {
            return Err(MlError::tracking(format!("metric {key} is not finite")));
        }
        self.update_run(run, |record| {
            record.metrics.insert(key.to_string(), value);
            Ok(())
        })
    }

    async fn log_param(&self, run: &RunHandle, key: &str, value: &str) -> Result<(), MlError> {
        self.update_run(run, |record| {
            // Parameters are write-once, as on a tracking server.
            match record.params.get(key) {
                Some(existing) if existing != value => Err(MlError::tracking(format!(
                    "param {key} already logged as '{existing}'"
                ))),
                _ => {
                    record.params.insert(key.to_string(), value.to_string());
                    Ok(())
                }
            }
        })
    }

    async fn log_model(
        &self,
        run: &RunHandle,
        model_file: &Path,
        artifact_path: &str,
    ) -> Result<(), MlError> {
        let dir = artifact_path.trim_matches('/');
        let model_name = file_name(model_file)?;
        self.copy_artifact(run, model_file, &format!("{dir}/{model_name}"))
            .await?;
        let descriptor = ModelDescriptor::new(run, dir, &model_name);
        self.store_artifact(run, &format!("{dir}/{MLMODEL_FILE}"), &descriptor.to_bytes()?)
    }

    async fn log_artifact(&self, run: &RunHandle, file: &Path) -> Result<(), MlError> {
        self.copy_artifact(run, file, &file_name(file)?).await
    }

    async fn end_run(&self, run: &RunHandle, status: RunStatus) -> Result<(), MlError> {
        self.update_run(run, |record| {
            record.status = status;
            record.end_time = Some(Utc::now());
            Ok(())
        })
    }

    async fn register_model(&self, model_uri: &str, name: &str) -> Result<String, MlError> {
        let uri = ModelUri::parse(model_uri)?;
        let run = self.locate_run(&uri.run_id)?;
        let artifacts = self.run_dir(&run).join("artifacts").join(&uri.path);
        if !artifacts.exists() {
            return Err(MlError::not_found(format!(
                "no artifacts at {model_uri}"
            )));
        }

        let mut registry = self.load_registry()?;
        let now = Utc::now();
        let idx = match registry.models.iter().position(|m| m.name == name) {
            Some(idx) => idx,
            None => {
                registry.models.push(RegisteredModel {
                    name: name.to_string(),
                    created_at: now,
                    versions: Vec::new(),
                });
                registry.models.len() - 1
            }
        };
        let model = &mut registry.models[idx];
        let version = model.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        model.versions.push(ModelVersionRecord {
            version,
            source: model_uri.to_string(),
            run_id: uri.run_id,
            stage: "None".to_string(),
            created_at: now,
            updated_at: now,
        });
        self.save_registry(&registry)?;
        Ok(version.to_string())
    }

    async fn transition_stage(
        &self,
        name: &str,
        version: &str,
        stage: &str,
    ) -> Result<(), MlError> {
        let wanted: u32 = version
            .parse()
            .map_err(|_| MlError::invalid_input(format!("invalid model version '{version}'")))?;
        let mut registry = self.load_registry()?;
        let record = registry
            .models
            .iter_mut()
            .find(|m| m.name == name)
            .and_then(|m| m.versions.iter_mut().find(|v| v.version == wanted))
            .ok_or_else(|| MlError::not_found(format!("model {name} version {version}")))?;
        record.stage = stage.to_string();
        record.updated_at = Utc::now();
        self.save_registry(&registry)
    }
}
