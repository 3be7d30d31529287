//! The abstract market gateway: the trading core depends only on
//! this trait, never on a concrete exchange client, so a paper gateway can
//! stand in during `--dry-run` and tests.

use crate::types::{MarketSummary, OrderIntent, OrderResult};
use async_trait::async_trait;
use common::Error;

#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// All markets under one event ticker (one per bracket).
    async fn get_event_markets(&self, event_ticker: &str) -> Result<Vec<MarketSummary>, Error>;

    async fn get_market(&self, ticker: &str) -> Result<MarketSummary, Error>;

    async fn get_orders(&self, ticker: &str) -> Result<Vec<crate::types::OrderRecord>, Error>;

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult, Error>;

    /// Available balance in cents.
    async fn get_balance(&self) -> Result<i64, Error>;

    /// Release any held connections (WS streams, connection pools).
    async fn close(&self);
}
