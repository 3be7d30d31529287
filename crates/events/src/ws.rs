//! Axum WebSocket fan-out: upgrade, subscribe to the event bus, forward
//! every published envelope to the client until it disconnects.

use axum::{
    extract::ws::{Message, WebSocket},
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::event::EventSender;

#[derive(Clone)]
pub struct WsState {
    pub tx: EventSender,
    pub connections: ConnectionManager,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: WsState) {
    let _guard = state.connections.track();
    let mut rx = state.tx.subscribe();
    debug!("dashboard websocket client connected");

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(envelope) => {
                        let json = match serde_json::to_string(&envelope) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("failed to serialize event envelope: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("dashboard websocket client lagged, skipped {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    debug!("dashboard websocket client disconnected");
}
