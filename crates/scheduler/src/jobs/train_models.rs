//! `train_models`: weekly retrain. Builds a historical feature/label
//! dataset per city from persisted forecasts and settlements, retrains
//! every ensemble member against it, and persists members that clear the
//! acceptance bar.

use crate::context::JobContext;
use crate::features::raw_inputs_from_forecasts;
use common::Error;
use prediction::feature::{build_feature_vector, FEATURE_DIM};
use std::path::PathBuf;
use tracing::{info, warn};

const LOOKBACK_DAYS: i64 = 120;
const TEST_FRACTION: f64 = 0.2;

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    let mut samples: Vec<(chrono::NaiveDate, [f64; FEATURE_DIM], f64)> = Vec::new();

    for city in ctx.cities() {
        let today = chrono::Utc::now().date_naive();
        for offset in 1..=LOOKBACK_DAYS {
            let date = today - chrono::Duration::days(offset);

            let settlement = storage::with_db(&ctx.db, move |db| db.get_settlement(city, date)).await?;
            let Some(settlement) = settlement else { continue };

            let rows = storage::with_db(&ctx.db, move |db| db.get_forecasts_for(city, date)).await?;
            if rows.is_empty() {
                continue;
            }
            let Some(raw) = raw_inputs_from_forecasts(city, date, rows) else { continue };
            samples.push((date, build_feature_vector(&raw), settlement.observed_high_f));
        }
    }

    if samples.len() < 20 {
        info!(sample_count = samples.len(), "not enough historical samples yet, skipping retrain");
        return Ok(());
    }

    // Chronological split, oldest first, so evaluation respects time order.
    samples.sort_by_key(|(date, _, _)| *date);

    let split = ((samples.len() as f64) * (1.0 - TEST_FRACTION)) as usize;
    let (train, test) = samples.split_at(split);
    let x_train: Vec<[f64; FEATURE_DIM]> = train.iter().map(|(_, x, _)| *x).collect();
    let y_train: Vec<f64> = train.iter().map(|(_, _, y)| *y).collect();
    let x_test: Vec<[f64; FEATURE_DIM]> = test.iter().map(|(_, x, _)| *x).collect();
    let y_test: Vec<f64> = test.iter().map(|(_, _, y)| *y).collect();

    let models_dir = PathBuf::from(&ctx.config.models_dir);
    let mut ensemble = ctx.ensemble.write().await;
    for member in ensemble.members_mut() {
        let metrics = member.regressor.train(&x_train, &y_train, &x_test, &y_test);
        if !metrics.accepted {
            warn!(model = member.regressor.name(), rmse = metrics.rmse, "retrained model missed acceptance bar, keeping prior weights");
            continue;
        }
        member.rmse = metrics.rmse;
        let path = models_dir.join(format!("{}.json", member.regressor.name()));
        if let Err(e) = member.regressor.save(&path) {
            warn!(model = member.regressor.name(), error = %e, "failed to persist retrained model");
        } else {
            info!(model = member.regressor.name(), rmse = metrics.rmse, sample_count = metrics.sample_count, "model retrained and persisted");
        }
    }

    Ok(())
}
