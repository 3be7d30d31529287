pub mod auth;
pub mod rate_limit;
pub mod rest;
pub mod ws;

pub use auth::KalshiAuth;
pub use rest::KalshiGateway;
