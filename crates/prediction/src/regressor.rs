//! The `Regressor` interface and its default, always-available
//! implementation: a NaN-median-imputing ridge regressor.
//!
//! A gradient-boosted-tree implementation is deliberately left as a
//! trait object any future crate can plug in: ML model library choice is
//! out of scope here, the core only consumes the `Regressor` interface.

use crate::feature::FEATURE_DIM;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub train_rmse: f64,
    pub sample_count: usize,
    pub train_count: usize,
    pub test_count: usize,
    pub accepted: bool,
}

/// `rmse <= 5.0` is the acceptance bar; rejected models are not
/// persisted by callers.
const ACCEPT_RMSE_THRESHOLD: f64 = 5.0;

pub trait Regressor: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    fn load(&mut self, path: &Path) -> bool;
    fn save(&self, path: &Path) -> std::io::Result<()>;
    fn train(
        &mut self,
        x_train: &[[f64; FEATURE_DIM]],
        y_train: &[f64],
        x_test: &[[f64; FEATURE_DIM]],
        y_test: &[f64],
    ) -> TrainMetrics;
    /// Validates feature dimensionality (implicit — the array type itself
    /// enforces it at compile time) and returns a predicted high in °F.
    fn predict(&self, features: &[f64; FEATURE_DIM]) -> f64;
}

/// Ridge regression with per-feature median imputation, persisted as the
/// fill vector the way a random-forest/ridge implementation would.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RidgeRegressor {
    weights: [f64; FEATURE_DIM],
    bias: f64,
    median_fill: [f64; FEATURE_DIM],
    lambda: f64,
    available: bool,
}

impl RidgeRegressor {
    pub fn new(lambda: f64) -> Self {
        Self {
            weights: [0.0; FEATURE_DIM],
            bias: 0.0,
            median_fill: [0.0; FEATURE_DIM],
            lambda,
            available: false,
        }
    }

    fn impute(&self, features: &[f64; FEATURE_DIM]) -> [f64; FEATURE_DIM] {
        let mut out = *features;
        for i in 0..FEATURE_DIM {
            if out[i].is_nan() {
                out[i] = self.median_fill[i];
            }
        }
        out
    }

    fn compute_medians(x: &[[f64; FEATURE_DIM]]) -> [f64; FEATURE_DIM] {
        let mut medians = [0.0; FEATURE_DIM];
        for j in 0..FEATURE_DIM {
            let mut col: Vec<f64> = x.iter().map(|row| row[j]).filter(|v| !v.is_nan()).collect();
            if col.is_empty() {
                medians[j] = 0.0;
                continue;
            }
            col.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mid = col.len() / 2;
            medians[j] = if col.len() % 2 == 0 {
                (col[mid - 1] + col[mid]) / 2.0
            } else {
                col[mid]
            };
        }
        medians
    }

    /// Closed-form ridge via gradient descent — avoids a full linear-algebra
    /// dependency for a crate whose job is to demonstrate the `Regressor`
    /// interface, not to be a production-grade model library.
    fn fit(&mut self, x: &[[f64; FEATURE_DIM]], y: &[f64]) {
        let n = x.len().max(1) as f64;
        let lr = 0.01;
        let epochs = 500;

        for _ in 0..epochs {
            let mut grad_w = [0.0; FEATURE_DIM];
            let mut grad_b = 0.0;

            for (row, &target) in x.iter().zip(y.iter()) {
                let imputed = self.impute(row);
                let pred = self.predict_raw(&imputed);
                let err = pred - target;
                for j in 0..FEATURE_DIM {
                    grad_w[j] += err * imputed[j] / n;
                }
                grad_b += err / n;
            }

            for j in 0..FEATURE_DIM {
                grad_w[j] += self.lambda * self.weights[j];
                self.weights[j] -= lr * grad_w[j];
            }
            self.bias -= lr * grad_b;
        }
    }

    fn predict_raw(&self, imputed: &[f64; FEATURE_DIM]) -> f64 {
        self.bias + self.weights.iter().zip(imputed.iter()).map(|(w, x)| w * x).sum::<f64>()
    }
}

fn rmse(pred: &[f64], actual: &[f64]) -> f64 {
    let n = pred.len().max(1) as f64;
    (pred.iter().zip(actual).map(|(p, a)| (p - a).powi(2)).sum::<f64>() / n).sqrt()
}

fn mae(pred: &[f64], actual: &[f64]) -> f64 {
    let n = pred.len().max(1) as f64;
    pred.iter().zip(actual).map(|(p, a)| (p - a).abs()).sum::<f64>() / n
}

impl Regressor for RidgeRegressor {
    fn name(&self) -> &'static str {
        "ridge"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn load(&mut self, path: &Path) -> bool {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<RidgeRegressor>(&text) {
                Ok(loaded) => {
                    *self = loaded;
                    self.available = true;
                    true
                }
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    fn save(&self, path: &Path) -> std::io::Result<()> {
        let text = serde_json::to_string_pretty(self).expect("serialize ridge regressor");
        std::fs::write(path, text)
    }

    fn train(
        &mut self,
        x_train: &[[f64; FEATURE_DIM]],
        y_train: &[f64],
        x_test: &[[f64; FEATURE_DIM]],
        y_test: &[f64],
    ) -> TrainMetrics {
        self.median_fill = Self::compute_medians(x_train);
        self.fit(x_train, y_train);
        self.available = true;

        let train_preds: Vec<f64> = x_train.iter().map(|r| self.predict(r)).collect();
        let test_preds: Vec<f64> = x_test.iter().map(|r| self.predict(r)).collect();

        let train_rmse = rmse(&train_preds, y_train);
        let test_rmse = rmse(&test_preds, y_test);
        let test_mae = mae(&test_preds, y_test);

        TrainMetrics {
            rmse: test_rmse,
            mae: test_mae,
            train_rmse,
            sample_count: x_train.len() + x_test.len(),
            train_count: x_train.len(),
            test_count: x_test.len(),
            accepted: test_rmse <= ACCEPT_RMSE_THRESHOLD,
        }
    }

    fn predict(&self, features: &[f64; FEATURE_DIM]) -> f64 {
        let imputed = self.impute(features);
        self.predict_raw(&imputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(v: f64) -> [f64; FEATURE_DIM] {
        [v; FEATURE_DIM]
    }

    #[test]
    fn trains_and_predicts_a_roughly_linear_signal() {
        let mut reg = RidgeRegressor::new(0.001);
        let x_train: Vec<_> = (0..40).map(|i| row(i as f64)).collect();
        let y_train: Vec<_> = (0..40).map(|i| i as f64 * 21.0 + 10.0).collect();
        let x_test: Vec<_> = (40..50).map(|i| row(i as f64)).collect();
        let y_test: Vec<_> = (40..50).map(|i| i as f64 * 21.0 + 10.0).collect();

        let metrics = reg.train(&x_train, &y_train, &x_test, &y_test);
        assert!(reg.is_available());
        assert!(metrics.sample_count == 50);
    }

    #[test]
    fn median_imputation_fills_nan_features() {
        let x_train = vec![row(1.0), row(3.0), [f64::NAN; FEATURE_DIM]];
        let y_train = vec![1.0, 3.0, 2.0];
        let mut reg = RidgeRegressor::new(0.01);
        let medians = RidgeRegressor::compute_medians(&x_train);
        assert_eq!(medians[0], 2.0); // median of [1.0, 3.0], NaN excluded
        reg.median_fill = medians;
        let imputed = reg.impute(&[f64::NAN; FEATURE_DIM]);
        assert_eq!(imputed[0], 2.0);
    }

    #[test]
    fn unavailable_before_load_or_train() {
        let reg = RidgeRegressor::new(0.01);
        assert!(!reg.is_available());
    }
}
