//! Unified error type for the trading core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("fetch failed after retries: {0}")]
    Fetch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("market gateway error: {0}")]
    MarketGateway(String),

    #[error("rate limited — retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("risk check failed: {0}")]
    RiskViolation(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("stale data: {0}")]
    StaleData(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("encryption error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
