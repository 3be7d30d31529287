//! `settle_trades`: once daily, once a city's settlement temperature is on
//! record, resolve every open trade against it and update risk state.

use crate::context::JobContext;
use chrono::Utc;
use common::{Error, FeeSchedule, Side, Trade, TradeStatus};
use tracing::{info, warn};

/// A bracket label round-trips one of three shapes produced by
/// `market::ticker::bracket_from_strikes`: `"below X"`, `"X or above"`, or
/// `"X-Y"`. Returns whether `temp_f` falls inside it.
fn temp_in_bracket(label: &str, temp_f: f64) -> Option<bool> {
    if let Some(cap) = label.strip_prefix("below ") {
        let cap: f64 = cap.parse().ok()?;
        return Some(temp_f < cap);
    }
    if let Some(floor) = label.strip_suffix(" or above") {
        let floor: f64 = floor.parse().ok()?;
        return Some(temp_f >= floor);
    }
    if let Some((floor, cap)) = label.split_once('-') {
        let floor: f64 = floor.parse().ok()?;
        let cap: f64 = cap.parse().ok()?;
        return Some(temp_f >= floor && temp_f <= cap);
    }
    None
}

pub async fn run_once(ctx: &JobContext) -> Result<(), Error> {
    let open_trades = storage::with_db(&ctx.db, |db| db.get_open_trades()).await?;
    let fees = FeeSchedule::weather();

    for trade in open_trades {
        let city = trade.city;
        let date = trade.trade_date;
        let settlement = storage::with_db(&ctx.db, move |db| db.get_settlement(city, date)).await?;
        let Some(settlement) = settlement else {
            continue;
        };

        let Some(in_bracket) = temp_in_bracket(&trade.bracket_label, settlement.observed_high_f) else {
            warn!(trade_id = trade.id, label = %trade.bracket_label, "could not parse bracket label, skipping settlement");
            continue;
        };
        let won = match trade.side {
            Side::Yes => in_bracket,
            Side::No => !in_bracket,
        };

        settle_one(ctx, &trade, won, settlement.observed_high_f, &settlement.source, &fees, Utc::now()).await?;
    }

    Ok(())
}

async fn settle_one(
    ctx: &JobContext,
    trade: &Trade,
    won: bool,
    settlement_temp_f: f64,
    settlement_source: &str,
    fees: &FeeSchedule,
    now: chrono::DateTime<Utc>,
) -> Result<(), Error> {
    let fee_cents = fees.taker_fee_cents(trade.quantity, trade.price_cents);
    let (status, pnl_cents) = if won {
        let gross = (100 - trade.price_cents) * trade.quantity;
        (TradeStatus::Won, gross - fee_cents)
    } else {
        let loss = trade.price_cents * trade.quantity;
        (TradeStatus::Lost, -(loss + fee_cents))
    };

    let post_mortem = format!(
        "settled {status:?}: model_p={:.3} market_p={:.3} settlement={settlement_temp_f:.1}F via {settlement_source}",
        trade.model_p, trade.market_p
    );

    let id = trade.id;
    let source = settlement_source.to_string();
    let mortem = post_mortem.clone();
    storage::with_db(&ctx.db, move |db| {
        db.settle_trade(id, status, settlement_temp_f, &source, pnl_cents, fee_cents, &mortem, now)
    })
    .await?;

    let operator_id = trade.operator_id;
    let trading_day = trade.trade_date;
    let mut state = storage::with_db(&ctx.db, move |db| db.get_daily_risk_state(operator_id, trading_day))
        .await?
        .unwrap_or_else(|| common::DailyRiskState::fresh(operator_id, trading_day));

    if won {
        state.consecutive_losses = 0;
        state.cooldown_until = None;
    } else {
        state.total_loss_cents += (trade.price_cents * trade.quantity) + fee_cents;
        state.consecutive_losses += 1;
        let operator = storage::with_db(&ctx.db, move |db| db.get_operator(operator_id)).await?;
        if let Some(operator) = operator {
            if state.consecutive_losses >= operator.consecutive_loss_limit {
                state.cooldown_until = Some(now + chrono::Duration::minutes(operator.cooldown_minutes_per_loss));
            }
        }
    }
    storage::with_db(&ctx.db, move |db| db.upsert_daily_risk_state(&state)).await?;

    events::publish(&ctx.events, events::DomainEvent::TradeSettled { trade_id: id, city: trade.city, status, pnl_cents: Some(pnl_cents) });
    info!(trade_id = id, status = ?status, pnl_cents, "trade settled");
    Ok(())
}
