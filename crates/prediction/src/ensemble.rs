//! Inverse-RMSE ensemble weighting over the available `Regressor` members:
//! `w_i = (1/rmse_i) / sum_j(1/rmse_j)`, with a large sentinel used
//! in place of a zero/near-zero RMSE so a single perfect-looking member
//! doesn't divide by zero and dominate completely.

use crate::feature::FEATURE_DIM;
use crate::regressor::Regressor;

/// Floor applied to a member's RMSE before inverting, so a suspiciously
/// perfect backtest doesn't produce an unbounded weight.
const MIN_RMSE_FLOOR: f64 = 0.1;

pub struct EnsembleMember {
    pub regressor: Box<dyn Regressor>,
    pub rmse: f64,
}

pub struct Ensemble {
    members: Vec<EnsembleMember>,
}

impl Ensemble {
    pub fn new(members: Vec<EnsembleMember>) -> Self {
        Self { members }
    }

    /// Exposes members for retraining; the weekly retrain job updates each
    /// member's `rmse` in place after a fresh `Regressor::train` call.
    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut EnsembleMember> {
        self.members.iter_mut()
    }

    fn weights(&self) -> Vec<f64> {
        let available: Vec<&EnsembleMember> =
            self.members.iter().filter(|m| m.regressor.is_available()).collect();
        if available.is_empty() {
            return vec![];
        }
        let inv_rmse: Vec<f64> =
            available.iter().map(|m| 1.0 / m.rmse.max(MIN_RMSE_FLOOR)).collect();
        let total: f64 = inv_rmse.iter().sum();
        inv_rmse.iter().map(|v| v / total).collect()
    }

    /// Returns `None` when no member is available — callers fall back to a
    /// sentinel prediction (the most recent raw forecast) in that case.
    pub fn predict(&self, features: &[f64; FEATURE_DIM]) -> Option<f64> {
        let weights = self.weights();
        if weights.is_empty() {
            return None;
        }
        let available: Vec<&EnsembleMember> =
            self.members.iter().filter(|m| m.regressor.is_available()).collect();

        let blended = available
            .iter()
            .zip(weights.iter())
            .map(|(m, w)| w * m.regressor.predict(features))
            .sum();
        Some(blended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regressor::TrainMetrics;
    use std::path::Path;

    struct FixedRegressor {
        value: f64,
        available: bool,
    }

    impl Regressor for FixedRegressor {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn load(&mut self, _path: &Path) -> bool {
            false
        }
        fn save(&self, _path: &Path) -> std::io::Result<()> {
            Ok(())
        }
        fn train(
            &mut self,
            _x_train: &[[f64; FEATURE_DIM]],
            _y_train: &[f64],
            _x_test: &[[f64; FEATURE_DIM]],
            _y_test: &[f64],
        ) -> TrainMetrics {
            TrainMetrics {
                rmse: 1.0,
                mae: 1.0,
                train_rmse: 1.0,
                sample_count: 0,
                train_count: 0,
                test_count: 0,
                accepted: true,
            }
        }
        fn predict(&self, _features: &[f64; FEATURE_DIM]) -> f64 {
            self.value
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let ensemble = Ensemble::new(vec![
            EnsembleMember { regressor: Box::new(FixedRegressor { value: 50.0, available: true }), rmse: 2.0 },
            EnsembleMember { regressor: Box::new(FixedRegressor { value: 60.0, available: true }), rmse: 4.0 },
        ]);
        let total: f64 = ensemble.weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lower_rmse_member_gets_higher_weight() {
        let ensemble = Ensemble::new(vec![
            EnsembleMember { regressor: Box::new(FixedRegressor { value: 50.0, available: true }), rmse: 1.0 },
            EnsembleMember { regressor: Box::new(FixedRegressor { value: 60.0, available: true }), rmse: 9.0 },
        ]);
        let w = ensemble.weights();
        assert!(w[0] > w[1]);
    }

    #[test]
    fn unavailable_members_are_excluded() {
        let ensemble = Ensemble::new(vec![
            EnsembleMember { regressor: Box::new(FixedRegressor { value: 50.0, available: false }), rmse: 1.0 },
            EnsembleMember { regressor: Box::new(FixedRegressor { value: 60.0, available: true }), rmse: 2.0 },
        ]);
        let features = [0.0; FEATURE_DIM];
        assert_eq!(ensemble.predict(&features), Some(60.0));
    }

    #[test]
    fn no_available_members_yields_none() {
        let ensemble = Ensemble::new(vec![EnsembleMember {
            regressor: Box::new(FixedRegressor { value: 50.0, available: false }),
            rmse: 1.0,
        }]);
        assert_eq!(ensemble.predict(&[0.0; FEATURE_DIM]), None);
    }
}
