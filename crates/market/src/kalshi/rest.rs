//! REST-backed `MarketGateway` for the Kalshi trade API: market discovery,
//! order placement, portfolio balance. All requests are RSA-PSS signed and
//! rate-limited.

use async_trait::async_trait;
use common::{Action, Error, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::gateway::MarketGateway;
use crate::kalshi::auth::KalshiAuth;
use crate::kalshi::rate_limit::KalshiRateLimiter;
use crate::types::{MarketSummary, OrderIntent, OrderRecord, OrderResult};

#[derive(Debug, Deserialize)]
struct MarketWire {
    ticker: String,
    event_ticker: String,
    title: String,
    floor_strike: Option<f64>,
    cap_strike: Option<f64>,
    yes_bid: i64,
    yes_ask: i64,
    no_bid: i64,
    no_ask: i64,
    status: String,
}

impl From<MarketWire> for MarketSummary {
    fn from(w: MarketWire) -> Self {
        MarketSummary {
            ticker: w.ticker,
            event_ticker: w.event_ticker,
            title: w.title,
            floor_strike: w.floor_strike,
            cap_strike: w.cap_strike,
            yes_bid: w.yes_bid,
            yes_ask: w.yes_ask,
            no_bid: w.no_bid,
            no_ask: w.no_ask,
            status: w.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    markets: Vec<MarketWire>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketWrapper {
    market: MarketWire,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: i64,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    ticker: String,
    side: Side,
    action: Action,
    client_order_id: String,
    count: i64,
    #[serde(rename = "type")]
    order_type: &'static str,
    yes_price: Option<i64>,
    no_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OrderWire {
    order_id: String,
    status: String,
    fill_count: i64,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponseWire {
    order: OrderWire,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    orders: Vec<OrderWireFull>,
}

#[derive(Debug, Deserialize)]
struct OrderWireFull {
    order_id: String,
    ticker: String,
    side: Side,
    action: Action,
    yes_price: Option<i64>,
    no_price: Option<i64>,
    count: i64,
    fill_count: i64,
    status: String,
}

pub struct KalshiGateway {
    client: reqwest::Client,
    auth: KalshiAuth,
    base_url: String,
    limiter: KalshiRateLimiter,
}

impl KalshiGateway {
    pub fn new(auth: KalshiAuth, use_demo: bool) -> Self {
        let base_url = if use_demo {
            "https://demo-api.kalshi.co".to_string()
        } else {
            "https://api.elections.kalshi.com".to_string()
        };

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("failed to build reqwest client");

        Self { client, auth, base_url, limiter: KalshiRateLimiter::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MarketGateway for KalshiGateway {
    async fn get_event_markets(&self, event_ticker: &str) -> Result<Vec<MarketSummary>, Error> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            self.limiter.wait_read().await;

            let path = "/trade-api/v2/markets";
            let headers = self.auth.headers("GET", path);
            let mut req = self
                .client
                .get(self.url(path))
                .headers(headers)
                .query(&[("event_ticker", event_ticker), ("limit", "200")]);
            if let Some(ref c) = cursor {
                req = req.query(&[("cursor", c.as_str())]);
            }

            let resp = req.send().await.map_err(|e| Error::Http(e.to_string()))?;
            let status = resp.status().as_u16();
            if status != 200 {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::MarketGateway(format!("status {status}: {body}")));
            }

            let body: MarketsResponse = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
            debug!("fetched {} markets for event {}", body.markets.len(), event_ticker);
            all.extend(body.markets.into_iter().map(MarketSummary::from));

            match body.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        Ok(all)
    }

    async fn get_market(&self, ticker: &str) -> Result<MarketSummary, Error> {
        self.limiter.wait_read().await;

        let path = format!("/trade-api/v2/markets/{ticker}");
        let headers = self.auth.headers("GET", &path);
        let resp = self.client.get(self.url(&path)).headers(headers).send().await.map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status == 404 {
            return Err(Error::MarketNotFound(ticker.to_string()));
        }
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::MarketGateway(format!("status {status}: {body}")));
        }

        let w: MarketWrapper = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(w.market.into())
    }

    async fn get_orders(&self, ticker: &str) -> Result<Vec<OrderRecord>, Error> {
        self.limiter.wait_read().await;

        let path = "/trade-api/v2/portfolio/orders";
        let headers = self.auth.headers("GET", path);
        let resp = self
            .client
            .get(self.url(path))
            .headers(headers)
            .query(&[("ticker", ticker)])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::MarketGateway(format!("status {status}: {body}")));
        }

        let body: OrdersResponse = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(body
            .orders
            .into_iter()
            .map(|o| OrderRecord {
                order_id: o.order_id,
                ticker: o.ticker,
                side: o.side,
                action: o.action,
                price_cents: o.yes_price.or(o.no_price).unwrap_or(0),
                count: o.count,
                fill_count: o.fill_count,
                status: o.status,
            })
            .collect())
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderResult, Error> {
        self.limiter.wait_write().await;

        let path = "/trade-api/v2/portfolio/orders";
        let headers = self.auth.headers("POST", path);
        let client_order_id = Uuid::new_v4().to_string();

        let (yes_price, no_price) = match intent.side {
            Side::Yes => (Some(intent.price_cents), None),
            Side::No => (None, Some(intent.price_cents)),
        };

        let body = CreateOrderRequest {
            ticker: intent.ticker.clone(),
            side: intent.side,
            action: intent.action,
            client_order_id,
            count: intent.count,
            order_type: "limit",
            yes_price,
            no_price,
        };

        debug!(
            ticker = %intent.ticker,
            price_cents = intent.price_cents,
            count = intent.count,
            reason = %intent.reason,
            "placing order"
        );

        let resp = self
            .client
            .post(self.url(path))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status == 429 {
            warn!("rate limited on order creation");
            return Err(Error::RateLimited { retry_after_ms: 1000 });
        }
        if status != 200 && status != 201 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::MarketGateway(format!("status {status}: {body}")));
        }

        let order_resp: CreateOrderResponseWire = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(OrderResult {
            order_id: order_resp.order.order_id,
            status: order_resp.order.status,
            fill_count: order_resp.order.fill_count,
        })
    }

    async fn get_balance(&self) -> Result<i64, Error> {
        self.limiter.wait_read().await;

        let path = "/trade-api/v2/portfolio/balance";
        let headers = self.auth.headers("GET", path);
        let resp = self.client.get(self.url(path)).headers(headers).send().await.map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::MarketGateway(format!("status {status}: {body}")));
        }

        let bal: BalanceResponse = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;
        Ok(bal.balance)
    }

    async fn close(&self) {}
}
