//! `trading_cycle`: every 15 minutes, compare the latest prediction against
//! live market prices for each active city and act on any edge that
//! clears the operator's minimum EV threshold and every risk gate.

use crate::context::JobContext;
use chrono::Utc;
use common::{local_standard_date, Action, Confidence, DailyRiskState, Error, PendingTrade, Prediction, Side, Trade, TradeStatus, WeatherForecast};
use market::types::{MarketSummary, OrderIntent};
use market::ticker::{bracket_from_strikes, build_event_ticker};
use risk::gates::{check_order, roll_daily_state, OrderRequest};
use risk::sizing::{expected_value, kelly_quantity};
use tracing::{info, warn};

const FORECAST_STALENESS_LIMIT_MINUTES: i64 = 120;

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    let operator = match storage::with_db(&ctx.db, |db| {
        db.get_singleton_operator()?.ok_or_else(|| Error::Config("no operator row configured".into()))
    })
    .await
    {
        Ok(op) => op,
        Err(e) => {
            warn!(error = %e, "no operator configured, skipping trading cycle");
            return Ok(());
        }
    };

    let now = Utc::now();
    let balance_cents = ctx.gateway.get_balance().await.unwrap_or(0);

    for city in ctx.cities() {
        if !operator.active_cities.contains(&city) {
            continue;
        }
        if let Err(e) = run_city(ctx, &operator, city, now, balance_cents).await {
            warn!(city = city.code(), error = %e, "trading cycle failed for city, continuing");
        }
    }

    Ok(())
}

/// Pre-scan validation: reject the cycle cleanly rather than act on a
/// prediction or market snapshot that can't be trusted.
fn validate_cycle(
    prediction: &Prediction,
    forecasts: &[WeatherForecast],
    markets: &[MarketSummary],
    now: chrono::DateTime<Utc>,
) -> Result<(), Error> {
    prediction.validate().map_err(Error::Validation)?;

    if let Some(newest) = forecasts.iter().map(|f| f.fetched_at).max() {
        let age_minutes = (now - newest).num_minutes();
        if age_minutes > FORECAST_STALENESS_LIMIT_MINUTES {
            return Err(Error::Validation(format!(
                "newest forecast is {age_minutes} minutes old, exceeds the {FORECAST_STALENESS_LIMIT_MINUTES} minute staleness limit"
            )));
        }
    }

    if markets.iter().any(|m| m.yes_ask < 1 || m.yes_ask > 99 || m.no_ask < 1 || m.no_ask > 99) {
        return Err(Error::Validation("a market price is outside [1,99]".into()));
    }

    Ok(())
}

async fn run_city(ctx: &JobContext, operator: &common::Operator, city: common::City, now: chrono::DateTime<Utc>, balance_cents: i64) -> Result<(), Error> {
    let trading_day = local_standard_date(city, now);

    let prediction = match storage::with_db(&ctx.db, move |db| db.get_latest_prediction(city, trading_day)).await? {
        Some(p) => p,
        None => {
            info!(city = city.code(), "no prediction available yet, skipping");
            return Ok(());
        }
    };

    let event_ticker = build_event_ticker(city, trading_day);
    let markets = match ctx.gateway.get_event_markets(&event_ticker).await {
        Ok(m) => m,
        Err(e) => {
            info!(city = city.code(), error = %e, "market data unavailable this cycle, skipping");
            return Ok(());
        }
    };

    let forecasts = storage::with_db(&ctx.db, move |db| db.get_forecasts_for(city, trading_day)).await?;
    if let Err(e) = validate_cycle(&prediction, &forecasts, &markets, now) {
        warn!(city = city.code(), error = %e, "trading cycle validation failed, skipping");
        return Ok(());
    }

    let state = storage::with_db(&ctx.db, move |db| Ok(db.get_daily_risk_state(operator.id, trading_day)?)).await?;
    let mut state = roll_daily_state(state.unwrap_or_else(|| DailyRiskState::fresh(operator.id, trading_day)), city, now);

    for market in &markets {
        let bracket = bracket_from_strikes(&market.ticker, market.floor_strike, market.cap_strike);
        let Some(model_bracket) = prediction.brackets.iter().find(|b| b.label == bracket.label) else {
            continue;
        };

        for (side, price_cents) in [(Side::Yes, market.yes_ask), (Side::No, market.no_ask)] {
            if price_cents <= 0 || price_cents >= 100 {
                continue;
            }
            let model_p = match side {
                Side::Yes => model_bracket.probability,
                Side::No => 1.0 - model_bracket.probability,
            };
            let market_p = price_cents as f64 / 100.0;
            let ev = expected_value(model_p, market_p);
            if ev < operator.min_ev_threshold {
                continue;
            }

            let quantity = kelly_quantity(operator, model_p, market_p, price_cents, balance_cents);
            let order = OrderRequest { market_ticker: market.ticker.clone(), price_cents, count: quantity };

            if let Err(e) = check_order(operator, &state, city, now, &order) {
                info!(city = city.code(), ticker = %market.ticker, side = ?side, reason = %e, "signal rejected by risk gates");
                continue;
            }

            place_or_queue(
                ctx,
                operator,
                city,
                trading_day,
                &market.ticker,
                &bracket.label,
                side,
                model_p,
                market_p,
                ev,
                quantity,
                price_cents,
                prediction.confidence,
                now,
                &mut state,
            )
            .await?;
        }
    }

    storage::with_db(&ctx.db, move |db| db.upsert_daily_risk_state(&state)).await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn place_or_queue(
    ctx: &JobContext,
    operator: &common::Operator,
    city: common::City,
    trading_day: chrono::NaiveDate,
    ticker: &str,
    bracket_label: &str,
    side: Side,
    model_p: f64,
    market_p: f64,
    ev: f64,
    quantity: i64,
    price_cents: i64,
    confidence: Confidence,
    now: chrono::DateTime<Utc>,
    state: &mut DailyRiskState,
) -> Result<(), Error> {
    match operator.trading_mode {
        common::TradingMode::Manual => {
            let pending = PendingTrade {
                id: 0,
                operator_id: operator.id,
                city,
                trade_date: trading_day,
                market_ticker: ticker.to_string(),
                bracket_label: bracket_label.to_string(),
                side,
                price_cents,
                quantity,
                model_p,
                market_p,
                entry_ev: ev,
                confidence,
                reasoning: format!("model p={model_p:.3} vs market p={market_p:.3}, ev={ev:.3}"),
                status: common::PendingStatus::Pending,
                created_at: now,
                expires_at: now + chrono::Duration::hours(2),
                acted_at: None,
            };
            let ticker_owned = ticker.to_string();
            let id = storage::with_db(&ctx.db, move |db| db.insert_pending_trade(&pending)).await?;
            events::publish(
                &ctx.events,
                events::DomainEvent::TradeQueued { pending_trade_id: id, city, market_ticker: ticker_owned, reasoning: format!("ev={ev:.3}") },
            );
        }
        common::TradingMode::Auto => {
            let intent = OrderIntent {
                ticker: ticker.to_string(),
                side,
                action: Action::Buy,
                price_cents,
                count: quantity,
                reason: format!("ev={ev:.3}"),
            };
            match ctx.gateway.place_order(&intent).await {
                Ok(result) => {
                    let trade = Trade {
                        id: 0,
                        operator_id: operator.id,
                        market_order_id: Some(result.order_id.clone()),
                        city,
                        trade_date: trading_day,
                        market_ticker: ticker.to_string(),
                        bracket_label: bracket_label.to_string(),
                        side,
                        price_cents,
                        quantity: result.fill_count.max(quantity),
                        model_p,
                        market_p,
                        entry_ev: ev,
                        confidence,
                        status: TradeStatus::Open,
                        settlement_temp_f: None,
                        settlement_source: None,
                        pnl_cents: None,
                        fees_cents: None,
                        post_mortem: None,
                        created_at: now,
                        settled_at: None,
                    };
                    let ticker_owned = ticker.to_string();
                    let trade_id = storage::with_db(&ctx.db, move |db| db.insert_trade(&trade)).await?;

                    state.total_exposure_cents += price_cents * quantity;
                    state.trades_count += 1;

                    events::publish(
                        &ctx.events,
                        events::DomainEvent::TradeExecuted {
                            trade_id,
                            city,
                            market_ticker: ticker_owned,
                            side,
                            price_cents,
                            quantity,
                        },
                    );
                    info!(city = city.code(), ticker, side = ?side, "order placed");
                }
                Err(e) => warn!(city = city.code(), ticker, side = ?side, error = %e, "order placement failed"),
            }
        }
    }
    Ok(())
}
