//! The five ordered risk gates: trading window, cooldown, daily
//! loss limit, max daily exposure, max trade size. Each gate short-circuits
//! the others — the first violation found is the one reported.

use chrono::{DateTime, Utc};
use common::{local_standard_date, local_standard_hour, DailyRiskState, Error, Operator};
use tracing::{info, warn};

const TRADING_WINDOW_START_HOUR: u32 = 6;
const TRADING_WINDOW_END_HOUR: u32 = 23;

pub struct OrderRequest {
    pub market_ticker: String,
    pub price_cents: i64,
    pub count: i64,
}

impl OrderRequest {
    fn cost_cents(&self) -> i64 {
        self.price_cents * self.count
    }
}

/// Advances `state` to a fresh day if the local-standard-time trading day
/// has rolled over since it was last updated.
pub fn roll_daily_state(state: DailyRiskState, city: common::City, now: DateTime<Utc>) -> DailyRiskState {
    let today = local_standard_date(city, now);
    if state.trading_day != today {
        DailyRiskState::fresh(state.operator_id, today)
    } else {
        state
    }
}

/// Runs the five gates in order, returning the first violation.
pub fn check_order(
    operator: &Operator,
    state: &DailyRiskState,
    city: common::City,
    now: DateTime<Utc>,
    order: &OrderRequest,
) -> Result<(), Error> {
    let hour = local_standard_hour(city, now);
    if hour < TRADING_WINDOW_START_HOUR || hour >= TRADING_WINDOW_END_HOUR {
        let msg = format!(
            "outside trading window: local hour {hour} not in [{TRADING_WINDOW_START_HOUR}, {TRADING_WINDOW_END_HOUR})"
        );
        warn!(ticker = %order.market_ticker, "{}", msg);
        return Err(Error::RiskViolation(msg));
    }

    if let Some(until) = state.cooldown_until {
        if now < until {
            let msg = format!("in cooldown until {until}");
            warn!(ticker = %order.market_ticker, "{}", msg);
            return Err(Error::RiskViolation(msg));
        }
    }

    if state.total_loss_cents >= operator.daily_loss_limit_cents {
        let msg = format!(
            "daily loss limit reached: {}¢ >= {}¢",
            state.total_loss_cents, operator.daily_loss_limit_cents
        );
        warn!(ticker = %order.market_ticker, "{}", msg);
        return Err(Error::RiskViolation(msg));
    }

    let cost = order.cost_cents();
    if state.total_exposure_cents + cost > operator.max_daily_exposure_cents {
        let msg = format!(
            "max daily exposure exceeded: {}¢ + {}¢ > {}¢",
            state.total_exposure_cents, cost, operator.max_daily_exposure_cents
        );
        warn!(ticker = %order.market_ticker, "{}", msg);
        return Err(Error::RiskViolation(msg));
    }

    if cost > operator.max_trade_size_cents {
        let msg = format!("max trade size exceeded: {}¢ > {}¢", cost, operator.max_trade_size_cents);
        warn!(ticker = %order.market_ticker, "{}", msg);
        return Err(Error::RiskViolation(msg));
    }

    info!(ticker = %order.market_ticker, cost_cents = cost, "risk gates passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{City, TradingMode};

    fn operator() -> Operator {
        Operator {
            id: 1,
            encrypted_credentials: String::new(),
            trading_mode: TradingMode::Auto,
            max_trade_size_cents: 5_000,
            daily_loss_limit_cents: 10_000,
            max_daily_exposure_cents: 20_000,
            min_ev_threshold: 0.02,
            cooldown_minutes_per_loss: 30,
            consecutive_loss_limit: 3,
            kelly_enabled: true,
            kelly_fraction: 0.25,
            max_bankroll_pct_per_trade: 0.05,
            max_contracts_per_trade: 200,
            active_cities: vec![City::Nyc],
            notifications_enabled: false,
            push_subscription: None,
            demo_mode: true,
        }
    }

    fn order() -> OrderRequest {
        OrderRequest { market_ticker: "KXHIGHNY-26FEB18-B54".into(), price_cents: 50, count: 10 }
    }

    #[test]
    fn passes_all_gates_with_fresh_state_during_window() {
        let noon_utc = Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap(); // noon NYC
        let state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, noon_utc));
        assert!(check_order(&operator(), &state, City::Nyc, noon_utc, &order()).is_ok());
    }

    #[test]
    fn rejects_outside_trading_window() {
        let night_utc = Utc.with_ymd_and_hms(2026, 2, 18, 6, 0, 0).unwrap(); // 1am NYC
        let state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, night_utc));
        let err = check_order(&operator(), &state, City::Nyc, night_utc, &order()).unwrap_err();
        assert!(matches!(err, Error::RiskViolation(_)));
    }

    #[test]
    fn rejects_during_cooldown() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap();
        let mut state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, now));
        state.cooldown_until = Some(now + chrono::Duration::minutes(10));
        let err = check_order(&operator(), &state, City::Nyc, now, &order()).unwrap_err();
        assert!(matches!(err, Error::RiskViolation(_)));
    }

    #[test]
    fn rejects_when_daily_loss_limit_reached() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap();
        let mut state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, now));
        state.total_loss_cents = 10_000;
        let err = check_order(&operator(), &state, City::Nyc, now, &order()).unwrap_err();
        assert!(matches!(err, Error::RiskViolation(_)));
    }

    #[test]
    fn rejects_when_exposure_would_exceed_cap() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap();
        let mut state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, now));
        state.total_exposure_cents = 19_900;
        let err = check_order(&operator(), &state, City::Nyc, now, &order()).unwrap_err();
        assert!(matches!(err, Error::RiskViolation(_)));
    }

    #[test]
    fn rejects_when_trade_size_too_large() {
        let now = Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap();
        let state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, now));
        let big_order = OrderRequest { market_ticker: "T".into(), price_cents: 90, count: 100 };
        let err = check_order(&operator(), &state, City::Nyc, now, &big_order).unwrap_err();
        assert!(matches!(err, Error::RiskViolation(_)));
    }

    #[test]
    fn daily_state_rolls_over_to_a_new_trading_day() {
        let yesterday = Utc.with_ymd_and_hms(2026, 2, 17, 17, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2026, 2, 18, 17, 0, 0).unwrap();
        let mut state = DailyRiskState::fresh(1, local_standard_date(City::Nyc, yesterday));
        state.total_loss_cents = 5_000;
        let rolled = roll_daily_state(state, City::Nyc, today);
        assert_eq!(rolled.total_loss_cents, 0);
        assert_eq!(rolled.trading_day, local_standard_date(City::Nyc, today));
    }
}
