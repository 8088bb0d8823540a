//! Configuration system for sentiflow.
//!
//! Two documents are involved:
//!
//! - `params.yaml`: the shared parameters store read by the stages
//!   (`data_ingestion`, `feature_engineering`, `model_building`). Required keys
//!   have no defaults; a missing key is a fatal configuration error.
//! - `sentiflow.toml`: optional pipeline settings (data source, artifact
//!   directories, tracking backend, registry). Uses `figment` for layered
//!   configuration: defaults -> workspace file -> `SENTIFLOW_*` environment.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name of the parameters store.
pub const PARAMS_FILE: &str = "params.yaml";

/// Default file name of the pipeline settings, relative to the workspace.
pub const CONFIG_FILE: &str = "sentiflow.toml";

// ---------------------------------------------------------------------------
// params.yaml
// ---------------------------------------------------------------------------

/// The parameters store shared by all stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    pub data_ingestion: DataIngestionParams,
    pub feature_engineering: FeatureEngineeringParams,
    pub model_building: ModelBuildingParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionParams {
    /// Fraction of filtered rows held out for evaluation, in (0, 1).
    pub test_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineeringParams {
    /// Upper bound on the bag-of-words vocabulary.
    pub max_features: usize,
}

/// Classifier hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBuildingParams {
    /// Inverse regularization strength.
    #[serde(default = "default_c")]
    pub c: f64,
    #[serde(default)]
    pub penalty: Penalty,
    #[serde(default)]
    pub solver: Solver,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Convergence threshold on the gradient infinity norm.
    #[serde(default = "default_tol")]
    pub tol: f64,
}

impl Default for ModelBuildingParams {
    fn default() -> Self {
        Self {
            c: default_c(),
            penalty: Penalty::default(),
            solver: Solver::default(),
            max_iter: default_max_iter(),
            tol: default_tol(),
        }
    }
}

fn default_c() -> f64 {
    1.0
}

fn default_max_iter() -> usize {
    100
}

fn default_tol() -> f64 {
    1e-4
}

/// Regularization applied to the classifier weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    #[default]
    L2,
    None,
}

impl Penalty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::None => "none",
        }
    }
}

/// Optimizer used to fit the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    #[default]
    Lbfgs,
    GradientDescent,
}

impl Solver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lbfgs => "lbfgs",
            Self::GradientDescent => "gradient_descent",
        }
    }
}

impl PipelineParams {
    /// Parse the parameters store from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let params: Self = Figment::from(Yaml::string(yaml)).extract()?;
        params.validate()?;
        Ok(params)
    }

    /// Reject values the stages cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let test_size = self.data_ingestion.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ConfigError::invalid(format!(
                "data_ingestion.test_size must be in (0, 1), got {test_size}"
            )));
        }
        if self.feature_engineering.max_features == 0 {
            return Err(ConfigError::invalid(
                "feature_engineering.max_features must be a positive integer",
            ));
        }
        let mb = &self.model_building;
        if !(mb.c.is_finite() && mb.c > 0.0) {
            return Err(ConfigError::invalid(format!(
                "model_building.c must be positive, got {}",
                mb.c
            )));
        }
        if mb.max_iter == 0 {
            return Err(ConfigError::invalid("model_building.max_iter must be positive"));
        }
        if !(mb.tol.is_finite() && mb.tol > 0.0) {
            return Err(ConfigError::invalid(format!(
                "model_building.tol must be positive, got {}",
                mb.tol
            )));
        }
        Ok(())
    }
}

/// Load the parameters store from a YAML file.
pub fn load_params(path: &Path) -> Result<PipelineParams, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let params: PipelineParams = Figment::from(Yaml::file(path)).extract()?;
    params.validate()?;
    tracing::debug!(path = %path.display(), "Loaded pipeline parameters");
    Ok(params)
}

// ---------------------------------------------------------------------------
// sentiflow.toml
// ---------------------------------------------------------------------------

/// Pipeline settings that are not part of the parameters store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the raw dataset comes from and how its columns are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// HTTP(S) URL or filesystem path of the raw CSV.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_text_column")]
    pub text_column: String,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    /// Columns discarded on ingestion (identifiers).
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
    /// Label value mapped to 1.
    #[serde(default = "default_positive_class")]
    pub positive_class: String,
    /// Label value mapped to 0.
    #[serde(default = "default_negative_class")]
    pub negative_class: String,
    /// Seed for the train/test shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            text_column: default_text_column(),
            label_column: default_label_column(),
            drop_columns: default_drop_columns(),
            positive_class: default_positive_class(),
            negative_class: default_negative_class(),
            seed: default_seed(),
        }
    }
}

fn default_source() -> String {
    "https://raw.githubusercontent.com/campusx-official/jupyter-masterclass/main/tweet_emotions.csv"
        .to_string()
}

fn default_text_column() -> String {
    "content".to_string()
}

fn default_label_column() -> String {
    "sentiment".to_string()
}

fn default_drop_columns() -> Vec<String> {
    vec!["tweet_id".to_string()]
}

fn default_positive_class() -> String {
    "happiness".to_string()
}

fn default_negative_class() -> String {
    "sadness".to_string()
}

fn default_seed() -> u64 {
    42
}

/// Optional text cleanup behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Blank out texts with fewer than three tokens after normalization.
    #[serde(default)]
    pub drop_short_texts: bool,
}

/// Artifact directories, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_interim_dir")]
    pub interim_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            interim_dir: default_interim_dir(),
            processed_dir: default_processed_dir(),
            models_dir: default_models_dir(),
            reports_dir: default_reports_dir(),
        }
    }
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_interim_dir() -> PathBuf {
    PathBuf::from("data/interim")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

/// Which experiment tracker receives runs and model versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingBackend {
    /// Remote MLflow-compatible server (DagsHub).
    #[default]
    Mlflow,
    /// Filesystem tracker under `local_dir`.
    Local,
}

/// Experiment tracking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub backend: TrackingBackend,
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
    /// Environment variable holding the access token for the remote tracker.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            backend: TrackingBackend::default(),
            tracking_uri: default_tracking_uri(),
            experiment_name: default_experiment_name(),
            token_env: default_token_env(),
            local_dir: default_local_dir(),
        }
    }
}

fn default_tracking_uri() -> String {
    "https://dagshub.com/Pravat-21/MLops-Mini-Project.mlflow".to_string()
}

fn default_experiment_name() -> String {
    "dvc-pipeline".to_string()
}

fn default_token_env() -> String {
    "DAGSHUB_PAT".to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("mlruns")
}

/// Basic-auth credentials for the remote tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackingCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for TrackingCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingCredentials")
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl TrackingConfig {
    /// Resolve credentials from the process environment.
    ///
    /// Returns `Ok(None)` for the local backend, which needs none.
    pub fn credentials(&self) -> Result<Option<TrackingCredentials>, ConfigError> {
        self.credentials_with(|var| std::env::var(var).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    pub fn credentials_with<F>(&self, lookup: F) -> Result<Option<TrackingCredentials>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.backend {
            TrackingBackend::Local => Ok(None),
            TrackingBackend::Mlflow => {
                let token = lookup(&self.token_env)
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| ConfigError::EnvVarMissing {
                        var: self.token_env.clone(),
                    })?;
                // DagsHub accepts the token as both user name and password.
                Ok(Some(TrackingCredentials {
                    username: token.clone(),
                    password: token,
                }))
            }
        }
    }
}

/// Model registry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Lifecycle stage a freshly registered version transitions to.
    #[serde(default = "default_stage")]
    pub stage: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            stage: default_stage(),
        }
    }
}

fn default_model_name() -> String {
    "my_model".to_string()
}

fn default_stage() -> String {
    "Staging".to_string()
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Root of the dated log folders, relative to the workspace.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Write the JSON log file in addition to stderr.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            file: true,
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_true() -> bool {
    true
}

/// Load pipeline settings from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`SENTIFLOW_TRACKING__BACKEND=local`, ...)
/// 2. The explicit config file, or `<workspace>/sentiflow.toml` when present
/// 3. Built-in defaults
pub fn load_config(
    workspace: &Path,
    explicit: Option<&Path>,
) -> Result<PipelineConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            let ws_config = workspace.join(CONFIG_FILE);
            if ws_config.exists() {
                figment = figment.merge(Toml::file(&ws_config));
            }
        }
    }

    figment = figment.merge(Env::prefixed("SENTIFLOW_").split("__"));

    Ok(figment.extract()?)
}
