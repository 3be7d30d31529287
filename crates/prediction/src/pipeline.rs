//! The full prediction pipeline: feature assembly, ensemble
//! inference, spread-derived confidence, and bracket-probability
//! integration, producing a `Prediction` ready to persist.

use crate::brackets::{compute_bracket_probabilities, synthetic_brackets, MarketBracket};
use crate::ensemble::Ensemble;
use crate::feature::{build_feature_vector, RawFeatureInputs};
use chrono::Utc;
use common::{BracketProbability, Confidence, Prediction};

pub struct PipelineInput {
    pub raw_features: RawFeatureInputs,
    pub prediction_id: i64,
    pub model_sources: Vec<String>,
}

/// Runs the ensemble and bracket integration. `market_brackets` is `None`
/// when the market gateway couldn't supply real bracket ranges, in which
/// case a synthetic six-bracket ladder is used.
pub fn run_pipeline(
    input: PipelineInput,
    ensemble: &Ensemble,
    fallback_high_f: f64,
    ensemble_std_f: f64,
    market_brackets: Option<Vec<MarketBracket>>,
) -> Prediction {
    let features = build_feature_vector(&input.raw_features);
    let mean_f = ensemble.predict(&features).unwrap_or(fallback_high_f);
    let confidence = Confidence::from_spread(input.raw_features.source_spread_f);

    let brackets = market_brackets.unwrap_or_else(|| synthetic_brackets(mean_f));
    let bracket_probs: Vec<BracketProbability> =
        compute_bracket_probabilities(mean_f, ensemble_std_f, &brackets);

    Prediction {
        id: input.prediction_id,
        city: input.raw_features.city,
        prediction_date: common::local_standard_date(input.raw_features.city, Utc::now()),
        generated_at: Utc::now(),
        ensemble_mean_f: mean_f,
        ensemble_std_f,
        confidence,
        model_sources: input.model_sources,
        brackets: bracket_probs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::EnsembleMember;
    use crate::regressor::{Regressor, TrainMetrics};
    use common::{City, WeatherSource};
    use std::collections::HashMap;
    use std::path::Path;

    struct FixedRegressor(f64);
    impl Regressor for FixedRegressor {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn load(&mut self, _path: &Path) -> bool {
            false
        }
        fn save(&self, _path: &Path) -> std::io::Result<()> {
            Ok(())
        }
        fn train(
            &mut self,
            _x: &[[f64; crate::feature::FEATURE_DIM]],
            _y: &[f64],
            _xt: &[[f64; crate::feature::FEATURE_DIM]],
            _yt: &[f64],
        ) -> TrainMetrics {
            unimplemented!()
        }
        fn predict(&self, _features: &[f64; crate::feature::FEATURE_DIM]) -> f64 {
            self.0
        }
    }

    #[test]
    fn produces_a_valid_closed_prediction() {
        let ensemble = Ensemble::new(vec![EnsembleMember {
            regressor: Box::new(FixedRegressor(55.0)),
            rmse: 2.0,
        }]);
        let mut highs = HashMap::new();
        highs.insert(WeatherSource::Nws, 55.0);
        let input = PipelineInput {
            raw_features: RawFeatureInputs {
                highs_by_source: highs,
                lows_by_source: HashMap::new(),
                nws_humidity_pct: None,
                nws_wind_mph: None,
                nws_cloud_cover_pct: None,
                source_spread_f: 1.0,
                source_count: 1.0,
                month: 2,
                day_of_year: 49,
                city: City::Nyc,
            },
            prediction_id: 1,
            model_sources: vec!["ridge".into()],
        };
        let prediction = run_pipeline(input, &ensemble, 55.0, 1.5, None);
        assert!(prediction.validate().is_ok());
        assert_eq!(prediction.confidence, Confidence::High);
    }
}
