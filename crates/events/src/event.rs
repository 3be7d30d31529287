//! The trading-core event vocabulary and its wire envelope.
//!
//! Every event is published as `{"type": "...", "timestamp": "...", "data":
//! {...}}` over a single in-process broadcast channel, the in-process
//! analogue of an external pub/sub broker.

use chrono::{DateTime, Utc};
use common::{City, Confidence, Side, TradeStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainEvent {
    TradeExecuted {
        trade_id: i64,
        city: City,
        market_ticker: String,
        side: Side,
        price_cents: i64,
        quantity: i64,
    },
    TradeQueued {
        pending_trade_id: i64,
        city: City,
        market_ticker: String,
        reasoning: String,
    },
    TradeSettled {
        trade_id: i64,
        city: City,
        status: TradeStatus,
        pnl_cents: Option<i64>,
    },
    TradeExpired {
        pending_trade_id: i64,
        city: City,
    },
    TradeSynced {
        trade_id: i64,
        market_order_id: String,
    },
    PredictionUpdated {
        prediction_id: i64,
        city: City,
        ensemble_mean_f: f64,
        confidence: Confidence,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::TradeExecuted { .. } => "trade.executed",
            DomainEvent::TradeQueued { .. } => "trade.queued",
            DomainEvent::TradeSettled { .. } => "trade.settled",
            DomainEvent::TradeExpired { .. } => "trade.expired",
            DomainEvent::TradeSynced { .. } => "trade.synced",
            DomainEvent::PredictionUpdated { .. } => "prediction.updated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn wrap(event: &DomainEvent, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_type: event.event_type().to_string(),
            timestamp,
            data: serde_json::to_value(event).expect("DomainEvent always serializes"),
        }
    }
}

pub type EventSender = broadcast::Sender<EventEnvelope>;

pub fn new_event_channel() -> EventSender {
    let (tx, _) = broadcast::channel(64);
    tx
}

/// Publish path: never propagates a publish error into the calling job —
/// a `send` with no subscribers just comes back `Err` and is discarded.
pub fn publish(tx: &EventSender, event: DomainEvent) {
    let envelope = EventEnvelope::wrap(&event, Utc::now());
    let _ = tx.send(envelope);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_executed_serializes_with_dotted_type_and_nested_data() {
        let event = DomainEvent::TradeExecuted {
            trade_id: 1,
            city: City::Nyc,
            market_ticker: "KXHIGHNY-26FEB18-B54".into(),
            side: Side::Yes,
            price_cents: 57,
            quantity: 20,
        };
        let envelope = EventEnvelope::wrap(&event, Utc::now());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "trade.executed");
        assert_eq!(json["data"]["trade_id"], 1);
        assert_eq!(json["data"]["price_cents"], 57);
    }

    #[test]
    fn prediction_updated_event_type_is_dotted() {
        let event = DomainEvent::PredictionUpdated {
            prediction_id: 7,
            city: City::Chi,
            ensemble_mean_f: 41.2,
            confidence: Confidence::Medium,
        };
        assert_eq!(event.event_type(), "prediction.updated");
    }

    #[test]
    fn broadcast_channel_send_receive_round_trips() {
        let tx = new_event_channel();
        let mut rx = tx.subscribe();

        publish(
            &tx,
            DomainEvent::TradeExpired { pending_trade_id: 3, city: City::Mia },
        );

        let received = rx.try_recv().unwrap();
        assert_eq!(received.event_type, "trade.expired");
        assert_eq!(received.data["pending_trade_id"], 3);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let tx = new_event_channel();
        publish(&tx, DomainEvent::TradeSynced { trade_id: 1, market_order_id: "ord-1".into() });
    }
}
