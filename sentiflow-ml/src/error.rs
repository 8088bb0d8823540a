//! Error types for the sentiflow-ml crate.
//!
//! [`MlError`] classifies the cause; [`StageError`] is the one failure kind a
//! stage returns, tagging the cause with the stage and the function it came
//! from. Nothing matches on either to recover; they exist for diagnostics.

use crate::stages::Stage;
use sentiflow_core::ConfigError;
use thiserror::Error;

/// Cause of a stage failure.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Preprocessing error: {0}")]
    Preprocessing(String),

    #[error("Feature engineering error: {0}")]
    Features(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Tracking error: {0}")]
    Tracking(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MlError {
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn features(msg: impl Into<String>) -> Self {
        Self::Features(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// A failed stage: where it failed and why.
#[derive(Debug, Error)]
#[error("{stage} failed in {function}: {source}")]
pub struct StageError {
    pub stage: Stage,
    pub function: &'static str,
    #[source]
    pub source: MlError,
}

impl StageError {
    pub fn new(stage: Stage, function: &'static str, source: impl Into<MlError>) -> Self {
        Self {
            stage,
            function,
            source: source.into(),
        }
    }
}

/// Attach stage and function names to a fallible call.
pub trait StageResultExt<T> {
    fn in_stage(self, stage: Stage, function: &'static str) -> Result<T, StageError>;
}

impl<T, E: Into<MlError>> StageResultExt<T> for Result<T, E> {
    fn in_stage(self, stage: Stage, function: &'static str) -> Result<T, StageError> {
        self.map_err(|e| StageError::new(stage, function, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_stage_error_display_and_source() {
        let res: Result<(), MlError> = Err(MlError::training("only one class in labels"));
        let err = res.in_stage(Stage::ModelTraining, "train_model").unwrap_err();
        assert_eq!(err.function, "train_model");
        assert_eq!(
            err.to_string(),
            "model training failed in train_model: Training error: only one class in labels"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "models/model.json");
        let err = StageError::new(Stage::ModelEvaluation, "load_model", io);
        assert!(matches!(err.source, MlError::Io(_)));
    }
}
