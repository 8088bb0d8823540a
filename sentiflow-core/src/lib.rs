//! # sentiflow-core: shared plumbing for the sentiflow pipeline
//!
//! Configuration (`params.yaml` and `sentiflow.toml`), the configuration error
//! type, atomic artifact persistence and tracing setup. The stage logic itself
//! lives in `sentiflow-ml`.

pub mod config;
pub mod error;
pub mod logging;
pub mod persistence;

pub use config::{
    PipelineConfig, PipelineParams, TrackingBackend, TrackingConfig, TrackingCredentials,
    load_config, load_params,
};
pub use error::ConfigError;
