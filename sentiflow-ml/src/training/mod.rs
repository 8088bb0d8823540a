//! Classifier training and the persisted model artifact.

pub mod artifact;
pub mod data;
pub mod logistic;
pub mod optim;

pub use artifact::{ModelArtifact, load_model, save_model};
pub use data::TrainingData;
pub use logistic::{FittedWeights, LogisticRegression};

use crate::error::MlError;
use crate::features::FeatureMatrix;
use std::collections::BTreeMap;

/// A binary classifier over dense features.
pub trait Classifier {
    /// Learn from features `x` and labels `y` in {0, 1}.
    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<(), MlError>;

    /// Predicted class for every row.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>, MlError>;

    /// Probability of the positive class for every row.
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>, MlError>;

    /// Hyperparameters as flat strings, for experiment tracking.
    fn params(&self) -> BTreeMap<String, String>;
}
