//! Thin wire-shaped types for market discovery and order placement,
//! independent of any one market gateway implementation.

use common::{Action, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub ticker: String,
    pub event_ticker: String,
    pub title: String,
    pub floor_strike: Option<f64>,
    pub cap_strike: Option<f64>,
    pub yes_bid: i64,
    pub yes_ask: i64,
    pub no_bid: i64,
    pub no_ask: i64,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub ticker: String,
    pub side: Side,
    pub action: Action,
    pub price_cents: i64,
    pub count: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: String,
    pub status: String,
    pub fill_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub ticker: String,
    pub side: Side,
    pub action: Action,
    pub price_cents: i64,
    pub count: i64,
    pub fill_count: i64,
    pub status: String,
}
