pub mod connection;
pub mod event;
pub mod ws;

pub use connection::ConnectionManager;
pub use event::{new_event_channel, publish, DomainEvent, EventEnvelope, EventSender};
pub use ws::{ws_handler, WsState};
