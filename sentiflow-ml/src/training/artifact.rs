//! On-disk model artifact.

use crate::error::MlError;
use crate::training::logistic::{FittedWeights, LogisticRegression};
use chrono::{DateTime, Utc};
use sentiflow_core::config::ModelBuildingParams;
use sentiflow_core::persistence;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MODEL_KIND: &str = "logistic_regression";
pub const FORMAT_VERSION: u32 = 1;

/// Serialized form of a fitted [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: String,
    pub format_version: u32,
    pub params: ModelBuildingParams,
    pub n_features: usize,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_iter: usize,
    pub converged: bool,
    pub created_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn from_model(model: &LogisticRegression) -> Result<Self, MlError> {
        let weights = model
            .weights()
            .ok_or_else(|| MlError::model("cannot save a model that was never fitted"))?;
        Ok(Self {
            kind: MODEL_KIND.to_string(),
            format_version: FORMAT_VERSION,
            params: model.params.clone(),
            n_features: weights.coefficients.len(),
            coefficients: weights.coefficients.clone(),
            intercept: weights.intercept,
            n_iter: weights.n_iter,
            converged: weights.converged,
            created_at: Utc::now(),
        })
    }

    pub fn into_model(self) -> Result<LogisticRegression, MlError> {
        if self.kind != MODEL_KIND {
            return Err(MlError::model(format!("unsupported model kind '{}'", self.kind)));
        }
        if self.format_version != FORMAT_VERSION {
            return Err(MlError::model(format!(
                "unsupported model format version {}",
                self.format_version
            )));
        }
        if self.coefficients.len() != self.n_features {
            return Err(MlError::model(format!(
                "artifact declares {} features but stores {} coefficients",
                self.n_features,
                self.coefficients.len()
            )));
        }
        Ok(LogisticRegression::from_weights(
            self.params,
            FittedWeights {
                coefficients: self.coefficients,
                intercept: self.intercept,
                n_iter: self.n_iter,
                converged: self.converged,
            },
        ))
    }
}

/// Write a fitted model atomically as JSON.
pub fn save_model(model: &LogisticRegression, path: &Path) -> Result<(), MlError> {
    let artifact = ModelArtifact::from_model(model)?;
    persistence::atomic_write_json(path, &artifact)?;
    tracing::debug!(path = %path.display(), n_features = artifact.n_features, "Model saved");
    Ok(())
}

/// Read a model written by [`save_model`]. A missing file is an I/O error.
pub fn load_model(path: &Path) -> Result<LogisticRegression, MlError> {
    let artifact: ModelArtifact = persistence::load_json(path)?;
    artifact.into_model()
}
