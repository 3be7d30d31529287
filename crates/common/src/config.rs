//! Application configuration, layered default → `config.toml` → environment
//! override → validation.

use crate::types::City;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the sqlite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// AEAD master key (base64), required — fatal at startup if absent.
    #[serde(default)]
    pub encryption_master_key: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `User-Agent` sent on every NWS request (NWS requires a contact
    /// string per their API usage policy).
    #[serde(default = "default_user_agent")]
    pub nws_user_agent: String,

    #[serde(default = "default_nws_rate")]
    pub nws_rate_limit_per_sec: f64,

    #[serde(default = "default_open_meteo_rate")]
    pub open_meteo_rate_limit_per_sec: f64,

    #[serde(default)]
    pub risk_defaults: RiskDefaults,

    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    /// VAPID push-notification keys; absence is a capability flag, not an
    /// error — push `send()` becomes a no-op when unset.
    #[serde(default)]
    pub vapid_private_key: Option<String>,
    #[serde(default)]
    pub vapid_public_key: Option<String>,

    #[serde(default = "default_http_bind")]
    pub http_bind_addr: String,

    #[serde(default = "default_cities")]
    pub cities: Vec<CityConfig>,
}

/// Grid-lookup seed data for a city — latitude/longitude only; the NWS
/// office/grid-x/grid-y triple is resolved once at runtime via
/// `/points/{lat},{lon}` and cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityConfig {
    pub city: City,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDefaults {
    #[serde(default = "default_max_trade_size")]
    pub max_trade_size_cents: i64,
    #[serde(default = "default_daily_loss_limit")]
    pub daily_loss_limit_cents: i64,
    #[serde(default = "default_max_daily_exposure")]
    pub max_daily_exposure_cents: i64,
    #[serde(default = "default_min_ev")]
    pub min_ev_threshold: f64,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes_per_loss: i64,
    #[serde(default = "default_consecutive_loss_limit")]
    pub consecutive_loss_limit: i64,
}

impl Default for RiskDefaults {
    fn default() -> Self {
        Self {
            max_trade_size_cents: default_max_trade_size(),
            daily_loss_limit_cents: default_daily_loss_limit(),
            max_daily_exposure_cents: default_max_daily_exposure(),
            min_ev_threshold: default_min_ev(),
            cooldown_minutes_per_loss: default_cooldown_minutes(),
            consecutive_loss_limit: default_consecutive_loss_limit(),
        }
    }
}

fn default_database_path() -> String {
    "boz_weather_trader.db".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_user_agent() -> String {
    "boz-weather-trader/0.1 (contact@example.com)".into()
}
fn default_nws_rate() -> f64 {
    1.0
}
fn default_open_meteo_rate() -> f64 {
    5.0
}
fn default_models_dir() -> String {
    "models".into()
}
fn default_http_bind() -> String {
    "127.0.0.1:8080".into()
}
fn default_max_trade_size() -> i64 {
    100
}
fn default_daily_loss_limit() -> i64 {
    1000
}
fn default_max_daily_exposure() -> i64 {
    2500
}
fn default_min_ev() -> f64 {
    0.05
}
fn default_cooldown_minutes() -> i64 {
    60
}
fn default_consecutive_loss_limit() -> i64 {
    3
}

fn default_cities() -> Vec<CityConfig> {
    vec![
        CityConfig { city: City::Nyc, lat: 40.7128, lon: -74.0060 },
        CityConfig { city: City::Chi, lat: 41.8781, lon: -87.6298 },
        CityConfig { city: City::Mia, lat: 25.7617, lon: -80.1918 },
        CityConfig { city: City::Aus, lat: 30.2672, lon: -97.7431 },
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            encryption_master_key: String::new(),
            log_level: default_log_level(),
            nws_user_agent: default_user_agent(),
            nws_rate_limit_per_sec: default_nws_rate(),
            open_meteo_rate_limit_per_sec: default_open_meteo_rate(),
            risk_defaults: RiskDefaults::default(),
            models_dir: default_models_dir(),
            vapid_private_key: None,
            vapid_public_key: None,
            http_bind_addr: default_http_bind(),
            cities: default_cities(),
        }
    }
}

impl AppConfig {
    /// Fails fast on any configuration invariant violation.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.encryption_master_key.is_empty() {
            return Err(crate::Error::Config(
                "encryption_master_key is required and has no default".into(),
            ));
        }
        if self.cities.is_empty() {
            return Err(crate::Error::Config("at least one city must be configured".into()));
        }
        Ok(())
    }
}

/// Load configuration: defaults → `config.toml` (if present) → environment
/// overrides → validation. Mirrors the layering used throughout the
/// ambient stack (`dotenvy` loads `.env` first, at the process entry point).
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, crate::Error> {
    let mut cfg = AppConfig::default();

    if let Some(path) = config_path {
        if let Ok(text) = std::fs::read_to_string(path) {
            cfg = toml::from_str(&text)
                .map_err(|e| crate::Error::Config(format!("invalid config.toml: {e}")))?;
        }
    }

    if let Ok(v) = std::env::var("DATABASE_PATH") {
        cfg.database_path = v;
    }
    if let Ok(v) = std::env::var("ENCRYPTION_MASTER_KEY") {
        cfg.encryption_master_key = v;
    }
    if let Ok(v) = std::env::var("LOG_LEVEL") {
        cfg.log_level = v;
    }
    if let Ok(v) = std::env::var("NWS_USER_AGENT") {
        cfg.nws_user_agent = v;
    }
    if let Ok(v) = std::env::var("VAPID_PRIVATE_KEY") {
        cfg.vapid_private_key = Some(v);
    }
    if let Ok(v) = std::env::var("VAPID_PUBLIC_KEY") {
        cfg.vapid_public_key = Some(v);
    }

    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_master_key() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_passes_with_master_key() {
        let mut cfg = AppConfig::default();
        cfg.encryption_master_key = "a-sufficiently-long-base64-key==".into();
        assert!(cfg.validate().is_ok());
    }
}
