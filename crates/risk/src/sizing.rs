//! EV calculation and Kelly-criterion position sizing.
//!
//! EV is deliberately not fee-adjusted at entry — fees are only recorded
//! against realized P&L after settlement (see `common::FeeSchedule`).

use common::Operator;

/// `EV = model_p - market_p`.
pub fn expected_value(model_p: f64, market_p: f64) -> f64 {
    model_p - market_p
}

/// Fractional-Kelly contract count for a YES-side buy at `price_cents`,
/// clamped to `[1, max_contracts_per_trade]`.
///
/// `qty = floor((model_p - market_p) / (1 - market_p) * fractional_kelly *
/// bankroll_cents / price_cents)`
pub fn kelly_quantity(operator: &Operator, model_p: f64, market_p: f64, price_cents: i64, bankroll_cents: i64) -> i64 {
    if !operator.kelly_enabled || market_p >= 1.0 || price_cents <= 0 {
        return 1;
    }

    let edge = (model_p - market_p) / (1.0 - market_p);
    let bankroll_at_risk = bankroll_cents as f64 * operator.max_bankroll_pct_per_trade;
    let kelly_stake = edge * operator.kelly_fraction * bankroll_at_risk.min(bankroll_cents as f64);
    let qty = (kelly_stake / price_cents as f64).floor() as i64;

    qty.clamp(1, operator.max_contracts_per_trade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{City, TradingMode};

    fn operator() -> Operator {
        Operator {
            id: 1,
            encrypted_credentials: String::new(),
            trading_mode: TradingMode::Auto,
            max_trade_size_cents: 50_000,
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

    #[test]
    fn ev_is_the_raw_probability_gap() {
        assert!((expected_value(0.65, 0.57) - 0.08).abs() < 1e-9);
    }

    #[test]
    fn kelly_quantity_is_at_least_one() {
        let op = operator();
        let qty = kelly_quantity(&op, 0.51, 0.50, 50, 100_000);
        assert!(qty >= 1);
    }

    #[test]
    fn kelly_quantity_respects_max_contracts() {
        let mut op = operator();
        op.max_contracts_per_trade = 5;
        let qty = kelly_quantity(&op, 0.90, 0.30, 30, 10_000_000);
        assert_eq!(qty, 5);
    }

    #[test]
    fn kelly_disabled_always_returns_one() {
        let mut op = operator();
        op.kelly_enabled = false;
        let qty = kelly_quantity(&op, 0.90, 0.30, 30, 10_000_000);
        assert_eq!(qty, 1);
    }
}
