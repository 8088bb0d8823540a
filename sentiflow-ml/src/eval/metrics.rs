//! Binary classification metrics.

use crate::error::MlError;
use serde::{Deserialize, Serialize};

/// The four scores recorded for every evaluation, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub auc: f64,
}

impl ClassificationMetrics {
    /// Score predicted classes and positive-class probabilities against labels.
    pub fn compute(y_true: &[u8], y_pred: &[u8], y_proba: &[f64]) -> Result<Self, MlError> {
        Ok(Self {
            accuracy: accuracy(y_true, y_pred)?,
            precision: precision(y_true, y_pred)?,
            recall: recall(y_true, y_pred)?,
            auc: roc_auc(y_true, y_proba)?,
        })
    }

    /// Metric name and value pairs, in a stable order.
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("auc", self.auc),
        ]
    }
}

/// Counts of a binary confusion matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Result<Self, MlError> {
        check_lengths(y_true.len(), y_pred.len())?;
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (check_label(t)?, check_label(p)?) {
                (1, 1) => cm.true_positive += 1,
                (0, 1) => cm.false_positive += 1,
                (0, 0) => cm.true_negative += 1,
                _ => cm.false_negative += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

fn check_lengths(expected: usize, got: usize) -> Result<(), MlError> {
    if expected == 0 {
        return Err(MlError::evaluation("no samples to score"));
    }
    if expected != got {
        return Err(MlError::evaluation(format!(
            "{expected} labels but {got} predictions"
        )));
    }
    Ok(())
}

fn check_label(label: u8) -> Result<u8, MlError> {
    if label > 1 {
        return Err(MlError::evaluation(format!("label {label} is not 0 or 1")));
    }
    Ok(label)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> Result<f64, MlError> {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred)?;
    Ok(ratio(cm.true_positive + cm.true_negative, cm.total()))
}

/// Zero when nothing was predicted positive.
pub fn precision(y_true: &[u8], y_pred: &[u8]) -> Result<f64, MlError> {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred)?;
    Ok(ratio(cm.true_positive, cm.true_positive + cm.false_positive))
}

/// Zero when there are no positive labels.
pub fn recall(y_true: &[u8], y_pred: &[u8]) -> Result<f64, MlError> {
    let cm = ConfusionMatrix::from_predictions(y_true, y_pred)?;
    Ok(ratio(cm.true_positive, cm.true_positive + cm.false_negative))
}

/// Area under the ROC curve via the Mann-Whitney U statistic.
///
/// Tied scores receive their average rank. Undefined, and an error, when the
/// labels contain a single class.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Result<f64, MlError> {
    check_lengths(y_true.len(), scores.len())?;
    for &label in y_true {
        check_label(label)?;
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(MlError::evaluation("scores contain NaN"));
    }
    let n_pos = y_true.iter().filter(|&&l| l == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(MlError::evaluation(
            "ROC AUC is undefined when only one class is present in the labels",
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Sum of 1-based ranks of the positives, averaging over ties.
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let positives_in_group = order[start..end]
            .iter()
            .filter(|&&i| y_true[i] == 1)
            .count();
        positive_rank_sum += average_rank * positives_in_group as f64;
        start = end;
    }

    let (n_pos, n_neg) = (n_pos as f64, n_neg as f64);
    let u = positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Ok(u / (n_pos * n_neg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_classifier() {
        let y = [1, 0, 1, 0];
        let m = ClassificationMetrics::compute(&y, &y, &[0.9, 0.1, 0.8, 0.3]).unwrap();
        assert_eq!(
            m,
            ClassificationMetrics {
                accuracy: 1.0,
                precision: 1.0,
                recall: 1.0,
                auc: 1.0
            }
        );
    }

    #[test]
    fn test_mixed_predictions() {
        let y_true = [1, 1, 0, 0, 1];
        let y_pred = [1, 0, 1, 0, 1];
        assert!((accuracy(&y_true, &y_pred).unwrap() - 0.6).abs() < 1e-12);
        assert!((precision(&y_true, &y_pred).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((recall(&y_true, &y_pred).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        assert_eq!(precision(&[1, 0], &[0, 0]).unwrap(), 0.0);
        assert_eq!(recall(&[0, 0], &[1, 0]).unwrap(), 0.0);
    }

    #[test]
    fn test_auc_with_ties() {
        // One positive tied with one negative: half credit for that pair.
        let auc = roc_auc(&[0, 1, 0, 1], &[0.2, 0.5, 0.5, 0.9]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
        let inverted = roc_auc(&[1, 0], &[0.1, 0.9]).unwrap();
        assert_eq!(inverted, 0.0);
        assert_eq!(roc_auc(&[1, 0, 1, 0], &[0.5; 4]).unwrap(), 0.5);
    }

    #[test]
    fn test_auc_single_class_is_error() {
        assert!(roc_auc(&[1, 1, 1], &[0.2, 0.4, 0.9]).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(accuracy(&[], &[]).is_err());
        assert!(accuracy(&[1, 0], &[1]).is_err());
        assert!(accuracy(&[2, 0], &[1, 0]).is_err());
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let m = ClassificationMetrics {
            accuracy: 0.5,
            precision: 0.25,
            recall: 1.0,
            auc: 0.75,
        };
        let value = serde_json::to_value(m).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 4);
        for key in ["accuracy", "precision", "recall", "auc"] {
            assert!(keys.contains(&key));
        }
    }

    #[test]
    fn test_confusion_matrix() {
        let cm = ConfusionMatrix::from_predictions(&[1, 1, 0, 0], &[1, 0, 1, 0]).unwrap();
        assert_eq!(cm.true_positive, 1);
        assert_eq!(cm.false_negative, 1);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 1);
        assert_eq!(cm.total(), 4);
    }
}
