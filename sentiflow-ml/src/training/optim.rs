//! Unconstrained first-order optimizers over a smooth objective.
//!
//! The objective writes its gradient into the provided buffer and returns
//! the function value. Both solvers use a backtracking Armijo line search and
//! stop when the gradient infinity norm drops to `tol`.

use crate::error::MlError;
use ndarray::Array1;
use std::collections::VecDeque;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;
/// Step shrink factor while backtracking.
const BACKTRACK: f64 = 0.5;
/// Below this the line search gives up.
const MIN_STEP: f64 = 1e-20;
/// Curvature pairs with `s·y` at or below this are discarded.
const CURVATURE_EPS: f64 = 1e-10;

/// Number of correction pairs kept by L-BFGS.
pub const LBFGS_MEMORY: usize = 10;

/// Where an optimizer stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimResult {
    pub x: Array1<f64>,
    pub value: f64,
    pub n_iter: usize,
    pub converged: bool,
}

/// Stopping criteria shared by both solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopCriteria {
    pub max_iter: usize,
    pub tol: f64,
}

/// A curvature pair `(s, y, 1 / s·y)`.
type Correction = (Array1<f64>, Array1<f64>, f64);

fn inf_norm(v: &Array1<f64>) -> f64 {
    v.fold(0.0_f64, |m, x| m.max(x.abs()))
}

fn evaluate<F>(objective: &mut F, x: &Array1<f64>, grad: &mut Array1<f64>) -> Result<f64, MlError>
where
    F: FnMut(&Array1<f64>, &mut Array1<f64>) -> f64,
{
    let value = objective(x, grad);
    if !value.is_finite() || grad.iter().any(|g| !g.is_finite()) {
        return Err(MlError::training(format!(
            "objective is not finite (value = {value})"
        )));
    }
    Ok(value)
}

struct LineSearchPoint {
    x: Array1<f64>,
    grad: Array1<f64>,
    value: f64,
    step: f64,
}

/// Backtrack from `step` along `direction` until the Armijo condition holds.
/// Returns `None` when no acceptable step exists above [`MIN_STEP`].
fn backtracking<F>(
    objective: &mut F,
    x: &Array1<f64>,
    value: f64,
    grad: &Array1<f64>,
    direction: &Array1<f64>,
    mut step: f64,
) -> Result<Option<LineSearchPoint>, MlError>
where
    F: FnMut(&Array1<f64>, &mut Array1<f64>) -> f64,
{
    let slope = grad.dot(direction);
    let mut candidate_grad = Array1::zeros(x.len());
    while step >= MIN_STEP {
        let mut candidate = x.clone();
        candidate.scaled_add(step, direction);
        let trial = objective(&candidate, &mut candidate_grad);
        if trial.is_finite() && trial <= value + ARMIJO_C1 * step * slope {
            if candidate_grad.iter().any(|g| !g.is_finite()) {
                return Err(MlError::training("gradient is not finite"));
            }
            return Ok(Some(LineSearchPoint {
                x: candidate,
                grad: candidate_grad,
                value: trial,
                step,
            }));
        }
        step *= BACKTRACK;
    }
    Ok(None)
}

/// Limited-memory BFGS with [`LBFGS_MEMORY`] correction pairs.
pub fn lbfgs<F>(
    mut objective: F,
    x0: Array1<f64>,
    stop: StopCriteria,
) -> Result<OptimResult, MlError>
where
    F: FnMut(&Array1<f64>, &mut Array1<f64>) -> f64,
{
    let mut x = x0;
    let mut grad = Array1::zeros(x.len());
    let mut value = evaluate(&mut objective, &x, &mut grad)?;
    let mut history: VecDeque<Correction> = VecDeque::with_capacity(LBFGS_MEMORY);

    if inf_norm(&grad) <= stop.tol {
        return Ok(OptimResult {
            x,
            value,
            n_iter: 0,
            converged: true,
        });
    }

    for iter in 1..=stop.max_iter {
        let mut direction = -two_loop(&grad, &history);
        if direction.dot(&grad) >= 0.0 {
            // Not a descent direction: restart from steepest descent.
            history.clear();
            direction = -&grad;
        }

        // Scale the very first step so it does not overshoot wildly.
        let initial = if history.is_empty() {
            (1.0 / inf_norm(&grad)).min(1.0)
        } else {
            1.0
        };
        let Some(point) =
            backtracking(&mut objective, &x, value, &grad, &direction, initial)?
        else {
            tracing::debug!(iter, "L-BFGS line search failed to make progress");
            return Ok(OptimResult {
                x,
                value,
                n_iter: iter - 1,
                converged: false,
            });
        };

        let s = &point.x - &x;
        let y = &point.grad - &grad;
        let sy = s.dot(&y);
        if sy > CURVATURE_EPS {
            if history.len() == LBFGS_MEMORY {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        x = point.x;
        grad = point.grad;
        value = point.value;

        if inf_norm(&grad) <= stop.tol {
            return Ok(OptimResult {
                x,
                value,
                n_iter: iter,
                converged: true,
            });
        }
    }

    Ok(OptimResult {
        x,
        value,
        n_iter: stop.max_iter,
        converged: false,
    })
}

/// Approximate inverse-Hessian times `grad`.
fn two_loop(grad: &Array1<f64>, history: &VecDeque<Correction>) -> Array1<f64> {
    let mut q = grad.clone();
    let mut alphas = vec![0.0; history.len()];
    for (i, (s, y, rho)) in history.iter().enumerate().rev() {
        let alpha = rho * s.dot(&q);
        alphas[i] = alpha;
        q.scaled_add(-alpha, y);
    }

    let gamma = history
        .back()
        .map(|(s, y, _)| s.dot(y) / y.dot(y))
        .unwrap_or(1.0);
    q *= gamma;

    for (i, (s, y, rho)) in history.iter().enumerate() {
        let beta = rho * y.dot(&q);
        q.scaled_add(alphas[i] - beta, s);
    }
    q
}

/// Steepest descent. The accepted step is doubled as the next trial step.
pub fn gradient_descent<F>(
    mut objective: F,
    x0: Array1<f64>,
    stop: StopCriteria,
) -> Result<OptimResult, MlError>
where
    F: FnMut(&Array1<f64>, &mut Array1<f64>) -> f64,
{
    let mut x = x0;
    let mut grad = Array1::zeros(x.len());
    let mut value = evaluate(&mut objective, &x, &mut grad)?;
    let mut step = (1.0 / inf_norm(&grad).max(f64::MIN_POSITIVE)).min(1.0);

    for iter in 0..=stop.max_iter {
        if inf_norm(&grad) <= stop.tol {
            return Ok(OptimResult {
                x,
                value,
                n_iter: iter,
                converged: true,
            });
        }
        if iter == stop.max_iter {
            break;
        }
        let direction = -&grad;
        let Some(point) = backtracking(&mut objective, &x, value, &grad, &direction, step)? else {
            return Ok(OptimResult {
                x,
                value,
                n_iter: iter,
                converged: false,
            });
        };
        step = point.step * 2.0;
        x = point.x;
        grad = point.grad;
        value = point.value;
    }

    Ok(OptimResult {
        x,
        value,
        n_iter: stop.max_iter,
        converged: false,
    })
}
