//! Shared types, config, error, and crypto primitives for the trading core.

pub mod config;
pub mod crypto;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::Error;
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
