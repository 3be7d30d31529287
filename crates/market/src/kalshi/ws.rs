//! WebSocket ticker feed for Kalshi: a reconnecting background task that
//! keeps a shared price cache warm so the trading cycle never blocks on a
//! REST round trip to price a market.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite;
use tracing::{debug, error, info, warn};

use crate::kalshi::auth::KalshiAuth;

#[derive(Debug, Clone)]
pub struct PriceEntry {
    pub yes_bid: i64,
    pub yes_ask: i64,
    pub last_price: i64,
    pub volume: i64,
    pub updated_at: Instant,
}

pub type PriceCache = Arc<RwLock<HashMap<String, PriceEntry>>>;

pub fn new_price_cache() -> PriceCache {
    Arc::new(RwLock::new(HashMap::new()))
}

#[derive(Debug, Serialize)]
struct SubscribeCmd {
    id: u32,
    cmd: &'static str,
    params: SubscribeParams,
}

#[derive(Debug, Serialize)]
struct SubscribeParams {
    channels: Vec<&'static str>,
    market_tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WsEnvelope {
    #[serde(rename = "type")]
    msg_type: Option<String>,
    msg: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TickerPayload {
    market_ticker: String,
    yes_bid: i64,
    yes_ask: i64,
    #[serde(default)]
    last_price: i64,
    #[serde(default)]
    volume: i64,
}

/// Auto-reconnecting Kalshi ticker-channel client, backoff capped at 30s
/// the way the weather-fetch clients in this workspace cap theirs.
pub struct KalshiWsClient {
    auth: KalshiAuth,
    ws_url: String,
    price_cache: PriceCache,
}

impl KalshiWsClient {
    pub fn new(auth: KalshiAuth, use_demo: bool, price_cache: PriceCache) -> Self {
        let ws_url = if use_demo {
            "wss://demo-api.kalshi.co/trade-api/ws/v2".to_string()
        } else {
            "wss://api.elections.kalshi.com/trade-api/ws/v2".to_string()
        };
        Self { auth, ws_url, price_cache }
    }

    pub async fn run(&self, tickers: Arc<RwLock<Vec<String>>>) {
        let mut backoff = Duration::from_secs(1);

        loop {
            info!(url = %self.ws_url, "connecting to Kalshi ticker feed");
            match self.connect_and_stream(&tickers).await {
                Ok(()) => {
                    info!("ticker feed closed cleanly");
                    backoff = Duration::from_secs(1);
                }
                Err(e) => {
                    error!(error = %e, backoff_secs = backoff.as_secs(), "ticker feed error, reconnecting");
                }
            }
            sleep(backoff).await;
            backoff = (backoff * 2).min(Duration::from_secs(30));
        }
    }

    async fn connect_and_stream(&self, tickers: &Arc<RwLock<Vec<String>>>) -> Result<(), common::Error> {
        let ws_path = "/trade-api/ws/v2";
        let (timestamp, signature) = self.auth.sign_request("GET", ws_path);

        let url = url::Url::parse(&self.ws_url).map_err(|e| common::Error::WebSocket(e.to_string()))?;

        let request = tungstenite::http::Request::builder()
            .uri(self.ws_url.as_str())
            .header("KALSHI-ACCESS-KEY", &self.auth.api_key)
            .header("KALSHI-ACCESS-TIMESTAMP", &timestamp)
            .header("KALSHI-ACCESS-SIGNATURE", &signature)
            .header("Host", url.host_str().unwrap_or("api.elections.kalshi.com"))
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header("Sec-WebSocket-Key", tungstenite::handshake::client::generate_key())
            .body(())
            .map_err(|e| common::Error::WebSocket(e.to_string()))?;

        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| common::Error::WebSocket(e.to_string()))?;

        info!("ticker feed connected");
        let (mut write, mut read) = ws_stream.split();

        let ticker_list = tickers.read().await.clone();
        if !ticker_list.is_empty() {
            let sub = SubscribeCmd {
                id: 1,
                cmd: "subscribe",
                params: SubscribeParams { channels: vec!["ticker"], market_tickers: ticker_list.clone() },
            };
            let sub_json = serde_json::to_string(&sub).map_err(|e| common::Error::WebSocket(e.to_string()))?;
            write
                .send(tungstenite::Message::Text(sub_json.into()))
                .await
                .map_err(|e| common::Error::WebSocket(e.to_string()))?;
            info!(count = ticker_list.len(), "subscribed to tickers");
        } else {
            warn!("no tickers to subscribe to yet");
        }

        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(tungstenite::Message::Text(text)) => self.handle_text_message(&text).await,
                Ok(tungstenite::Message::Ping(data)) => {
                    let _ = write.send(tungstenite::Message::Pong(data)).await;
                }
                Ok(tungstenite::Message::Close(_)) => {
                    info!("close frame received");
                    break;
                }
                Err(e) => return Err(common::Error::WebSocket(e.to_string())),
                _ => {}
            }
        }

        Ok(())
    }

    async fn handle_text_message(&self, text: &str) {
        let msg: WsEnvelope = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "failed to parse ticker feed message");
                return;
            }
        };

        match msg.msg_type.as_deref() {
            Some("ticker") => {
                if let Some(payload) = msg.msg {
                    match serde_json::from_value::<TickerPayload>(payload) {
                        Ok(t) => {
                            let mut cache = self.price_cache.write().await;
                            cache.insert(
                                t.market_ticker.clone(),
                                PriceEntry {
                                    yes_bid: t.yes_bid,
                                    yes_ask: t.yes_ask,
                                    last_price: t.last_price,
                                    volume: t.volume,
                                    updated_at: Instant::now(),
                                },
                            );
                        }
                        Err(e) => debug!(error = %e, "failed to parse ticker payload"),
                    }
                }
            }
            Some("error") => warn!(raw = %text, "ticker feed reported an error"),
            _ => {}
        }
    }
}
