//! Multi-source weather ingestion: rate limiting, fetch-with-retry, the
//! NWS/Open-Meteo clients, the grid-coordinate cache, the CLI settlement
//! parser, and dedup-for-prediction.

pub mod cli_parser;
pub mod fetch;
pub mod grid_cache;
pub mod normalize;
pub mod nws;
pub mod open_meteo;
pub mod rate_limit;
pub mod station;
pub mod units;
