//! `generate_predictions`: at minutes 05 and 35 of every hour, run the
//! ensemble over each city's freshest forecasts for tomorrow's trading day
//! and persist the resulting bracket distribution.

use crate::context::JobContext;
use crate::features::{mean_and_std, raw_inputs_from_forecasts};
use common::{local_standard_date, Error};
use market::ticker::{bracket_from_strikes, build_event_ticker};
use prediction::pipeline::{run_pipeline, PipelineInput};
use tracing::{info, warn};

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    let now = chrono::Utc::now();

    for city in ctx.cities() {
        let target_date = local_standard_date(city, now) + chrono::Duration::days(1);

        let rows = storage::with_db(&ctx.db, move |db| db.get_forecasts_for(city, target_date)).await?;
        if rows.is_empty() {
            info!(city = city.code(), "no forecasts available yet, skipping prediction this cycle");
            continue;
        }

        let Some(raw_inputs) = raw_inputs_from_forecasts(city, target_date, rows) else {
            continue;
        };

        let (fallback_high_f, ensemble_std_f) = mean_and_std(&raw_inputs.highs_by_source);
        let model_sources: Vec<String> = raw_inputs.highs_by_source.keys().map(|s| s.label().to_string()).collect();

        let event_ticker = build_event_ticker(city, target_date);
        let market_brackets = match ctx.gateway.get_event_markets(&event_ticker).await {
            Ok(markets) if !markets.is_empty() => Some(
                markets
                    .iter()
                    .map(|m| bracket_from_strikes(&m.ticker, m.floor_strike, m.cap_strike))
                    .collect(),
            ),
            _ => None,
        };

        let input = PipelineInput { raw_features: raw_inputs, prediction_id: 0, model_sources };

        let ensemble = ctx.ensemble.read().await;
        let prediction = run_pipeline(input, &ensemble, fallback_high_f, ensemble_std_f, market_brackets);
        drop(ensemble);

        if let Err(e) = prediction.validate() {
            warn!(city = city.code(), error = %e, "prediction failed closure validation, not persisting");
            continue;
        }

        let city_for_event = prediction.city;
        let mean_for_event = prediction.ensemble_mean_f;
        let confidence_for_event = prediction.confidence;

        let stored_id = storage::with_db(&ctx.db, move |db| db.insert_prediction(&prediction)).await?;

        events::publish(
            &ctx.events,
            events::DomainEvent::PredictionUpdated {
                prediction_id: stored_id,
                city: city_for_event,
                ensemble_mean_f: mean_for_event,
                confidence: confidence_for_event,
            },
        );

        info!(city = city_for_event.code(), mean_f = mean_for_event, "prediction generated");
    }

    Ok(())
}
