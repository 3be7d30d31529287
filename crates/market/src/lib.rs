//! The abstract market gateway, event-ticker/bracket derivation, a
//! concrete Kalshi REST/WS implementation, and a paper gateway for
//! `--dry-run` and tests.

pub mod gateway;
pub mod kalshi;
pub mod paper;
pub mod ticker;
pub mod types;

pub use gateway::MarketGateway;
pub use paper::PaperGateway;
