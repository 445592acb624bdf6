//! Binary logistic regression with balanced class weights.
//!
//! Minimizes `C * sum_i s_i * logloss(y_i, sigmoid(w.x_i + b)) + 0.5 * |w|^2`
//! with damped Newton steps. The bias is not penalized. Sample weight `s_i`
//! is `n / (2 * n_class)` when balancing is enabled, else 1.

use crate::error::{FraudError, Result};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MAX_HALVINGS: usize = 30;

/// Classifier hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Upper bound on Newton iterations
    pub max_iter: usize,
    /// Stop once the gradient's max-norm falls below this
    pub tolerance: f64,
    /// Inverse L2 regularization strength
    pub regularization: f64,
    /// Weight classes inversely to their frequency
    pub balanced: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-4,
            regularization: 1.0,
            balanced: true,
        }
    }
}

/// Unfitted classifier
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticConfig,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self { config }
    }

    /// Fit on feature matrix `x` and 0/1 labels `y`.
    pub fn fit(&self, x: ArrayView2<f64>, y: &[u8]) -> Result<FittedLogistic> {
        let (n, d) = x.dim();
        if n == 0 {
            return Err(FraudError::Training("no training rows".into()));
        }
        if y.len() != n {
            return Err(FraudError::Training(format!(
                "{} labels for {} rows",
                y.len(),
                n
            )));
        }

        let class_weights = self.class_weights(y);
        let c = self.config.regularization;
        let targets: Array1<f64> = y.iter().map(|&v| f64::from(v)).collect();
        let sample_weights: Array1<f64> = y
            .iter()
            .map(|&v| class_weights[usize::from(v)])
            .collect();

        // Parameters are [w_0 .. w_{d-1}, b].
        let mut theta = Array1::<f64>::zeros(d + 1);
        let mut loss = objective(x, &targets, &sample_weights, &theta, c);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iter {
            let z = linear(x, &theta);
            let p = z.mapv(sigmoid);

            let residual = &sample_weights * &(&p - &targets) * c;
            let mut gradient = Array1::<f64>::zeros(d + 1);
            gradient
                .slice_mut(s![..d])
                .assign(&(x.t().dot(&residual) + &theta.slice(s![..d])));
            gradient[d] = residual.sum();

            let grad_norm = gradient.iter().fold(0.0f64, |m, g| m.max(g.abs()));
            if grad_norm < self.config.tolerance {
                converged = true;
                break;
            }

            let curvature = &sample_weights * &p.mapv(|pi| pi * (1.0 - pi)) * c;
            let hessian = hessian(x, &curvature);
            let step = solve_spd(&hessian, &gradient).ok_or_else(|| {
                FraudError::Training(format!(
                    "Hessian is not positive definite at iteration {}",
                    iterations
                ))
            })?;

            let mut scale = 1.0;
            let mut accepted = false;
            for _ in 0..MAX_HALVINGS {
                let candidate = &theta - &(&step * scale);
                let candidate_loss = objective(x, &targets, &sample_weights, &candidate, c);
                if candidate_loss <= loss {
                    theta = candidate;
                    loss = candidate_loss;
                    accepted = true;
                    break;
                }
                scale *= 0.5;
            }

            iterations += 1;
            if !accepted {
                // No descent along the Newton direction: at numerical optimum.
                converged = grad_norm < self.config.tolerance.sqrt();
                break;
            }
        }

        if converged {
            debug!(iterations, loss, "Logistic regression converged");
        } else {
            warn!(
                iterations,
                max_iter = self.config.max_iter,
                loss,
                "Logistic regression did not converge"
            );
        }

        Ok(FittedLogistic {
            weights: theta.slice(s![..d]).to_owned(),
            bias: theta[d],
            class_weights,
            iterations,
            converged,
        })
    }

    fn class_weights(&self, y: &[u8]) -> [f64; 2] {
        if !self.config.balanced {
            return [1.0, 1.0];
        }
        let n = y.len() as f64;
        let positives = y.iter().filter(|&&v| v == 1).count() as f64;
        let negatives = n - positives;
        let weight = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 1.0 };
        [weight(negatives), weight(positives)]
    }
}

/// Learned classifier parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLogistic {
    pub weights: Array1<f64>,
    pub bias: f64,
    /// Sample weight used for class 0 and class 1
    pub class_weights: [f64; 2],
    pub iterations: usize,
    pub converged: bool,
}

impl FittedLogistic {
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&self.weights) + self.bias
    }

    /// Positive-class probability per row
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Array1<f64> {
        self.decision_function(x).mapv(sigmoid)
    }
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn linear(x: ArrayView2<f64>, theta: &Array1<f64>) -> Array1<f64> {
    let d = x.ncols();
    x.dot(&theta.slice(s![..d])) + theta[d]
}

fn objective(
    x: ArrayView2<f64>,
    targets: &Array1<f64>,
    sample_weights: &Array1<f64>,
    theta: &Array1<f64>,
    c: f64,
) -> f64 {
    let d = x.ncols();
    let z = linear(x, theta);
    let data_loss: f64 = z
        .iter()
        .zip(targets)
        .zip(sample_weights)
        .map(|((&zi, &yi), &si)| {
            // log(1 + e^z) - y*z, stable for large |z|
            si * (zi.max(0.0) + (-zi.abs()).exp().ln_1p() - yi * zi)
        })
        .sum();
    let penalty = 0.5 * theta.slice(s![..d]).mapv(|w| w * w).sum();
    c * data_loss + penalty
}

/// `[X 1]^T diag(curvature) [X 1]` plus the unit ridge on the weights.
fn hessian(x: ArrayView2<f64>, curvature: &Array1<f64>) -> Array2<f64> {
    let (n, d) = x.dim();
    let mut augmented = Array2::<f64>::ones((n, d + 1));
    augmented.slice_mut(s![.., ..d]).assign(&x);

    let weighted = &augmented * &curvature.view().insert_axis(Axis(1));
    let mut h = augmented.t().dot(&weighted);
    for i in 0..d {
        h[[i, i]] += 1.0;
    }
    h
}

/// Solve `a * x = b` for symmetric positive definite `a` by Cholesky.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return None;
        }
        let diag = diag.sqrt();
        l[[j, j]] = diag;
        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / diag;
        }
    }

    // Forward substitution: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }

    // Back substitution: L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_solve_spd() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = solve_spd(&a, &b).unwrap();
        assert!((x[0] - 0.5).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);

        let singular = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(solve_spd(&singular, &b).is_none());
    }

    #[test]
    fn test_balanced_class_weights() {
        let clf = LogisticRegression::default();
        let weights = clf.class_weights(&[0, 0, 0, 1]);
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1] - 2.0).abs() < 1e-12);

        let unbalanced = LogisticRegression::new(LogisticConfig {
            balanced: false,
            ..LogisticConfig::default()
        });
        assert_eq!(unbalanced.class_weights(&[0, 1, 1]), [1.0, 1.0]);
    }

    #[test]
    fn test_fit_separates_classes() {
        let x = array![[-2.0], [-1.5], [-1.0], [1.0], [1.5], [2.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let fitted = LogisticRegression::default().fit(x.view(), &y).unwrap();

        assert!(fitted.converged);
        assert!(fitted.weights[0] > 0.0);
        let p = fitted.predict_proba(x.view());
        assert!(p[0] < 0.5 && p[5] > 0.5);
        assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.1, 1.0], [0.4, -1.0], [0.9, 0.5], [1.2, -0.3], [-0.7, 0.2]];
        let y = [0, 0, 1, 1, 0];
        let a = LogisticRegression::default().fit(x.view(), &y).unwrap();
        let b = LogisticRegression::default().fit(x.view(), &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fit_rejects_label_mismatch() {
        let x = array![[1.0], [2.0]];
        let err = LogisticRegression::default().fit(x.view(), &[1]).unwrap_err();
        assert!(matches!(err, FraudError::Training(_)));
    }
}
