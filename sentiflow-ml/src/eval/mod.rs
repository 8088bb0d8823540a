//! Model evaluation.

pub mod metrics;

pub use metrics::{ClassificationMetrics, ConfusionMatrix, accuracy, precision, recall, roc_auc};

use crate::error::MlError;
use crate::training::{Classifier, TrainingData};

/// Score `model` on a labelled dataset.
pub fn evaluate_model<C: Classifier + ?Sized>(
    model: &C,
    data: &TrainingData,
) -> Result<ClassificationMetrics, MlError> {
    let y_pred = model.predict(&data.x)?;
    let y_proba = model.predict_proba(&data.x)?;
    ClassificationMetrics::compute(&data.y, &y_pred, &y_proba)
}
