//! In-memory `MarketGateway` used for `--dry-run` and tests: orders fill
//! immediately at the requested price, nothing touches the network.

use async_trait::async_trait;
use common::Error;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::gateway::MarketGateway;
use crate::types::{MarketSummary, OrderIntent, OrderRecord, OrderResult};

pub struct PaperGateway {
    markets: Mutex<HashMap<String, MarketSummary>>,
    orders: Mutex<Vec<OrderRecord>>,
    balance_cents: Mutex<i64>,
}

impl PaperGateway {
    pub fn new(starting_balance_cents: i64) -> Self {
        Self {
            markets: Mutex::new(HashMap::new()),
            orders: Mutex::new(Vec::new()),
            balance_cents: Mutex::new(starting_balance_cents),
        }
    }

    /// Seeds a market the gateway can answer queries about — callers load
    /// these from a fixture or a real-gateway snapshot before dry-running.
    pub fn seed_market(&self, market: MarketSummary) {
        self.markets.lock().unwrap().insert(market.ticker.clone(), market);
    }
}

#[async_trait]
impl MarketGateway for PaperGateway {
    async fn get_event_markets(&self, event_ticker: &str) -> Result<Vec<MarketSummary>, Error> {
        Ok(self
            .markets
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.event_ticker == event_ticker)
            .cloned()
            .collect())
    }

    async fn get_market(&self, ticker: &str) -> Result<MarketSummary, Error> {
        self.markets
            .lock()
            .unwrap()
            .get(ticker)
            .cloned()
            .ok_or_else(|| Error::MarketNotFound(ticker.to_string()))
    }

    async fn get_orders(&self, ticker: &str) -> Result<Vec<OrderRecord>, Error> {
        Ok(self.orders.lock().unwrap().iter().filter(|o| o.ticker == ticker).cloned().collect())
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult, Error> {
        let order_id = Uuid::new_v4().to_string();
        let record = OrderRecord {
            order_id: order_id.clone(),
            ticker: intent.ticker.clone(),
            side: intent.side,
            action: intent.action,
            price_cents: intent.price_cents,
            count: intent.count,
            fill_count: intent.count,
            status: "executed".to_string(),
        };
        self.orders.lock().unwrap().push(record);

        let cost_cents = intent.price_cents * intent.count;
        *self.balance_cents.lock().unwrap() -= cost_cents;

        Ok(OrderResult { order_id, status: "executed".to_string(), fill_count: intent.count })
    }

    async fn get_balance(&self) -> Result<i64, Error> {
        Ok(*self.balance_cents.lock().unwrap())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Action, Side};

    #[tokio::test]
    async fn seeded_market_is_retrievable() {
        let gateway = PaperGateway::new(100_000);
        gateway.seed_market(MarketSummary {
            ticker: "KXHIGHNY-26FEB18-B54".into(),
            event_ticker: "KXHIGHNY-26FEB18".into(),
            title: "54-58F".into(),
            floor_strike: Some(54.0),
            cap_strike: Some(58.0),
            yes_bid: 40,
            yes_ask: 45,
            no_bid: 55,
            no_ask: 60,
            status: "open".into(),
        });

        let market = gateway.get_market("KXHIGHNY-26FEB18-B54").await.unwrap();
        assert_eq!(market.floor_strike, Some(54.0));
    }

    #[tokio::test]
    async fn placing_an_order_debits_balance_and_fills_fully() {
        let gateway = PaperGateway::new(100_000);
        let intent = OrderIntent {
            ticker: "KXHIGHNY-26FEB18-B54".into(),
            side: Side::Yes,
            action: Action::Buy,
            price_cents: 45,
            count: 10,
            reason: "test".into(),
        };
        let result = gateway.place_order(&intent).await.unwrap();
        assert_eq!(result.fill_count, 10);
        assert_eq!(gateway.get_balance().await.unwrap(), 100_000 - 450);
    }

    #[tokio::test]
    async fn unknown_market_is_not_found() {
        let gateway = PaperGateway::new(100_000);
        let err = gateway.get_market("NOPE").await.unwrap_err();
        assert!(matches!(err, Error::MarketNotFound(_)));
    }
}
