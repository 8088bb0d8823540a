//! Binary logistic regression.

use crate::error::MlError;
use crate::features::FeatureMatrix;
use crate::training::Classifier;
use crate::training::optim::{self, StopCriteria};
use ndarray::{Array1, ArrayView1, s};
use sentiflow_core::config::{ModelBuildingParams, Penalty, Solver};
use std::collections::BTreeMap;

/// Weights learned by [`LogisticRegression::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct FittedWeights {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_iter: usize,
    pub converged: bool,
}

/// Logistic regression with an unpenalized intercept.
///
/// Minimizes `C * sum(logloss) + 0.5 * |w|^2` under the `l2` penalty and
/// `C * sum(logloss)` without one.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    pub params: ModelBuildingParams,
    weights: Option<FittedWeights>,
}

impl LogisticRegression {
    pub fn new(params: ModelBuildingParams) -> Self {
        Self {
            params,
            weights: None,
        }
    }

    /// Rebuild a fitted model from stored weights.
    pub fn from_weights(params: ModelBuildingParams, weights: FittedWeights) -> Self {
        Self {
            params,
            weights: Some(weights),
        }
    }

    pub fn weights(&self) -> Option<&FittedWeights> {
        self.weights.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    /// `w·x + b` for every row.
    pub fn decision_function(&self, x: &FeatureMatrix) -> Result<Array1<f64>, MlError> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| MlError::model("model used before fit"))?;
        if x.ncols() != weights.coefficients.len() {
            return Err(MlError::model(format!(
                "model expects {} features, input has {}",
                weights.coefficients.len(),
                x.ncols()
            )));
        }
        let w = ArrayView1::from(weights.coefficients.as_slice());
        Ok(x.dot(&w) + weights.intercept)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

fn validate_training_set(x: &FeatureMatrix, y: &[u8]) -> Result<(), MlError> {
    if x.is_empty() {
        return Err(MlError::training("training matrix is empty"));
    }
    if x.nrows() != y.len() {
        return Err(MlError::training(format!(
            "{} rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(bad) = y.iter().find(|&&label| label > 1) {
        return Err(MlError::training(format!("label {bad} is not 0 or 1")));
    }
    let positives = y.iter().filter(|&&label| label == 1).count();
    if positives == 0 || positives == y.len() {
        return Err(MlError::training(format!(
            "only one class in labels (class {})",
            y[0]
        )));
    }
    Ok(())
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &FeatureMatrix, y: &[u8]) -> Result<(), MlError> {
        validate_training_set(x, y)?;
        let n_features = x.ncols();
        let c = self.params.c;
        let l2 = self.params.penalty == Penalty::L2;
        let target: Array1<f64> = y.iter().map(|&label| f64::from(label)).collect();

        // theta = [w_0 .. w_{d-1}, b]
        let objective = |theta: &Array1<f64>, grad: &mut Array1<f64>| -> f64 {
            let w = theta.slice(s![..n_features]);
            let z = x.dot(&w) + theta[n_features];
            let loss = z.mapv(softplus).sum() - target.dot(&z);
            let residual = (z.mapv(sigmoid) - &target) * c;

            let mut grad_w = x.t().dot(&residual);
            let mut value = c * loss;
            if l2 {
                value += 0.5 * w.dot(&w);
                grad_w += &w;
            }
            grad.slice_mut(s![..n_features]).assign(&grad_w);
            grad[n_features] = residual.sum();
            value
        };

        let stop = StopCriteria {
            max_iter: self.params.max_iter,
            tol: self.params.tol,
        };
        let x0 = Array1::zeros(n_features + 1);
        let result = match self.params.solver {
            Solver::Lbfgs => optim::lbfgs(objective, x0, stop)?,
            Solver::GradientDescent => optim::gradient_descent(objective, x0, stop)?,
        };

        if !result.converged {
            tracing::warn!(
                solver = self.params.solver.as_str(),
                max_iter = self.params.max_iter,
                n_iter = result.n_iter,
                "Logistic regression did not converge; consider raising max_iter"
            );
        }
        tracing::debug!(
            objective = result.value,
            n_iter = result.n_iter,
            "Logistic regression fitted"
        );

        self.weights = Some(FittedWeights {
            coefficients: result.x.slice(s![..n_features]).to_vec(),
            intercept: result.x[n_features],
            n_iter: result.n_iter,
            converged: result.converged,
        });
        Ok(())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>, MlError> {
        Ok(self.decision_function(x)?.mapv(sigmoid).to_vec())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>, MlError> {
        Ok(self
            .decision_function(x)?
            .iter()
            .map(|&z| u8::from(z > 0.0))
            .collect())
    }

    fn params(&self) -> BTreeMap<String, String> {
        let p = &self.params;
        BTreeMap::from([
            ("C".to_string(), p.c.to_string()),
            ("fit_intercept".to_string(), "true".to_string()),
            ("max_iter".to_string(), p.max_iter.to_string()),
            ("penalty".to_string(), p.penalty.as_str().to_string()),
            ("solver".to_string(), p.solver.as_str().to_string()),
            ("tol".to_string(), p.tol.to_string()),
        ])
    }
}
