//! Domain types shared across the trading core: cities, the eight
//! persisted entities, and the thin market-side vocabulary
//! (`Side`/`Action`, fee schedule) that the abstract market gateway and the
//! risk/EV layers share.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Cities ─────────────────────────────────────────────────────────────

/// The four cities this operator trades. A fixed, closed set — matches the
/// one-hot city indicator in the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum City {
    Nyc,
    Chi,
    Mia,
    Aus,
}

impl City {
    pub const ALL: [City; 4] = [City::Nyc, City::Chi, City::Mia, City::Aus];

    /// Kalshi event-ticker series prefix, e.g. `KXHIGHNY`.
    pub fn series(self) -> &'static str {
        match self {
            City::Nyc => "KXHIGHNY",
            City::Chi => "KXHIGHCHI",
            City::Mia => "KXHIGHMIA",
            City::Aus => "KXHIGHAUS",
        }
    }

    /// Fixed UTC offset (hours) used for local-standard-time trading-day
    /// computation. DST-insensitive by design.
    pub fn utc_offset_hours(self) -> i64 {
        match self {
            City::Nyc | City::Mia => -5,
            City::Chi | City::Aus => -6,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            City::Nyc => "NYC",
            City::Chi => "CHI",
            City::Mia => "MIA",
            City::Aus => "AUS",
        }
    }
}

/// Compute the "trading day" / "settlement day" for a city: the calendar
/// date in the city's fixed local-standard-time offset.
pub fn local_standard_date(city: City, at: DateTime<Utc>) -> NaiveDate {
    let shifted = at + chrono::Duration::hours(city.utc_offset_hours());
    shifted.date_naive()
}

/// Local-standard-time hour-of-day (0-23), used by the trading-window gate.
pub fn local_standard_hour(city: City, at: DateTime<Utc>) -> u32 {
    let shifted = at + chrono::Duration::hours(city.utc_offset_hours());
    shifted.time().hour()
}

use chrono::Timelike;

// ── Weather source labels ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherSource {
    Nws,
    NwsGridpoint,
    OpenMeteoGfs,
    OpenMeteoEcmwf,
    OpenMeteoIcon,
}

impl WeatherSource {
    pub fn label(self) -> &'static str {
        match self {
            WeatherSource::Nws => "NWS",
            WeatherSource::NwsGridpoint => "NWS:gridpoint",
            WeatherSource::OpenMeteoGfs => "Open-Meteo:GFS",
            WeatherSource::OpenMeteoEcmwf => "Open-Meteo:ECMWF",
            WeatherSource::OpenMeteoIcon => "Open-Meteo:ICON",
        }
    }
}

// ── Operator ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Manual,
    Auto,
}

/// Singleton in v1; multi-row tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    /// AEAD-encrypted market credentials (base64), never held decrypted
    /// outside the call that needs them.
    pub encrypted_credentials: String,
    pub trading_mode: TradingMode,
    pub max_trade_size_cents: i64,
    pub daily_loss_limit_cents: i64,
    pub max_daily_exposure_cents: i64,
    pub min_ev_threshold: f64,
    pub cooldown_minutes_per_loss: i64,
    pub consecutive_loss_limit: i64,
    pub kelly_enabled: bool,
    pub kelly_fraction: f64,
    pub max_bankroll_pct_per_trade: f64,
    pub max_contracts_per_trade: i64,
    pub active_cities: Vec<City>,
    pub notifications_enabled: bool,
    pub push_subscription: Option<String>,
    pub demo_mode: bool,
}

impl Operator {
    /// `min_ev ≥ 0` is the only hard invariant; `daily_loss_limit ≤
    /// max_daily_exposure` is advised but not enforced.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_ev_threshold < 0.0 {
            return Err("min_ev_threshold must be >= 0".into());
        }
        Ok(())
    }
}

// ── WeatherForecast ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub id: i64,
    pub city: City,
    pub target_date: NaiveDate,
    pub source: WeatherSource,
    pub forecast_high_f: f64,
    pub forecast_low_f: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_mph: Option<f64>,
    pub cloud_cover_pct: Option<f64>,
    pub raw_response: String,
    pub fetched_at: DateTime<Utc>,
}

// ── Prediction ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// `< 2.0°F → high`, `< 4.0°F → medium`, else `low`.
    pub fn from_spread(spread_f: f64) -> Self {
        if spread_f < 2.0 {
            Confidence::High
        } else if spread_f < 4.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketProbability {
    pub label: String,
    /// `None` for the bottom-edge (open-ended below) bracket.
    pub lower_f: Option<f64>,
    /// `None` for the top-edge (open-ended above) bracket.
    pub upper_f: Option<f64>,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub city: City,
    pub prediction_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub ensemble_mean_f: f64,
    pub ensemble_std_f: f64,
    pub confidence: Confidence,
    pub model_sources: Vec<String>,
    pub brackets: Vec<BracketProbability>,
}

impl Prediction {
    /// Probability-closure invariant: sum within ±0.01 of 1.0, every
    /// entry finite and in `[0,1]`.
    pub fn validate(&self) -> Result<(), String> {
        let sum: f64 = self.brackets.iter().map(|b| b.probability).sum();
        if (sum - 1.0).abs() > 0.01 {
            return Err(format!("bracket probabilities sum to {sum}, expected 1.0±0.01"));
        }
        for b in &self.brackets {
            if !b.probability.is_finite() || !(0.0..=1.0).contains(&b.probability) {
                return Err(format!("bracket {} has invalid probability {}", b.label, b.probability));
            }
        }
        Ok(())
    }
}

// ── Side / Action (market vocabulary) ────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

// ── Trade / PendingTrade ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Won,
    Lost,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub operator_id: i64,
    pub market_order_id: Option<String>,
    pub city: City,
    pub trade_date: NaiveDate,
    pub market_ticker: String,
    pub bracket_label: String,
    pub side: Side,
    pub price_cents: i64,
    pub quantity: i64,
    pub model_p: f64,
    pub market_p: f64,
    pub entry_ev: f64,
    pub confidence: Confidence,
    pub status: TradeStatus,
    pub settlement_temp_f: Option<f64>,
    pub settlement_source: Option<String>,
    pub pnl_cents: Option<i64>,
    pub fees_cents: Option<i64>,
    pub post_mortem: Option<String>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, TradeStatus::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PendingStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
    Executed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTrade {
    pub id: i64,
    pub operator_id: i64,
    pub city: City,
    pub trade_date: NaiveDate,
    pub market_ticker: String,
    pub bracket_label: String,
    pub side: Side,
    pub price_cents: i64,
    pub quantity: i64,
    pub model_p: f64,
    pub market_p: f64,
    pub entry_ev: f64,
    pub confidence: Confidence,
    pub reasoning: String,
    pub status: PendingStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub acted_at: Option<DateTime<Utc>>,
}

impl PendingTrade {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            PendingStatus::Rejected | PendingStatus::Expired | PendingStatus::Executed
        )
    }
}

// ── Settlement ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: i64,
    pub city: City,
    pub settlement_date: NaiveDate,
    pub observed_high_f: f64,
    pub observed_low_f: Option<f64>,
    pub source: String,
    pub raw_report: String,
    pub created_at: DateTime<Utc>,
}

// ── DailyRiskState ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRiskState {
    pub operator_id: i64,
    pub trading_day: NaiveDate,
    pub total_loss_cents: i64,
    pub total_exposure_cents: i64,
    pub consecutive_losses: i64,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub trades_count: i64,
}

impl DailyRiskState {
    pub fn fresh(operator_id: i64, trading_day: NaiveDate) -> Self {
        Self {
            operator_id,
            trading_day,
            total_loss_cents: 0,
            total_exposure_cents: 0,
            consecutive_losses: 0,
            cooldown_until: None,
            trades_count: 0,
        }
    }
}

// ── Fee schedule ──────────────────────────────────────────────────────

/// Kalshi's weather-market fee schedule. The EV formula is explicitly
/// *not* fee-adjusted at entry; this is used only to populate
/// `Trade.fees_cents` after settlement.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    pub taker_coeff: f64,
    pub maker_coeff: f64,
}

impl FeeSchedule {
    pub fn weather() -> Self {
        Self {
            taker_coeff: 0.07,
            maker_coeff: 0.0175,
        }
    }

    pub fn taker_fee_cents(&self, count: i64, price_cents: i64) -> i64 {
        self.fee_cents(self.taker_coeff, count, price_cents)
    }

    pub fn maker_fee_cents(&self, count: i64, price_cents: i64) -> i64 {
        self.fee_cents(self.maker_coeff, count, price_cents)
    }

    fn fee_cents(&self, coeff: f64, count: i64, price_cents: i64) -> i64 {
        let p = price_cents as f64 / 100.0;
        let fee_dollars = coeff * (count as f64) * p * (1.0 - p);
        let fee_cents = fee_dollars * 100.0;
        (fee_cents - 1e-9).ceil().max(0.0) as i64
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::weather()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taker_fee_50c_100_contracts() {
        let fs = FeeSchedule::weather();
        assert_eq!(fs.taker_fee_cents(100, 50), 175);
    }

    #[test]
    fn taker_fee_symmetric_around_50c() {
        let fs = FeeSchedule::weather();
        assert_eq!(fs.taker_fee_cents(100, 1), fs.taker_fee_cents(100, 99));
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(Confidence::from_spread(1.0), Confidence::High);
        assert_eq!(Confidence::from_spread(3.0), Confidence::Medium);
        assert_eq!(Confidence::from_spread(5.0), Confidence::Low);
    }

    #[test]
    fn prediction_validates_closure() {
        let p = Prediction {
            id: 1,
            city: City::Nyc,
            prediction_date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            generated_at: Utc::now(),
            ensemble_mean_f: 55.0,
            ensemble_std_f: 1.5,
            confidence: Confidence::High,
            model_sources: vec!["NWS".into()],
            brackets: vec![
                BracketProbability { label: "Below 54F".into(), lower_f: None, upper_f: Some(54.0), probability: 0.3 },
                BracketProbability { label: "54-56F".into(), lower_f: Some(54.0), upper_f: Some(56.0), probability: 0.4 },
                BracketProbability { label: "56F or above".into(), lower_f: Some(56.0), upper_f: None, probability: 0.3 },
            ],
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn local_standard_date_is_dst_insensitive() {
        // NYC is fixed UTC-5 regardless of season.
        let at = DateTime::parse_from_rfc3339("2026-07-18T03:30:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(
            local_standard_date(City::Nyc, at),
            NaiveDate::from_ymd_opt(2026, 7, 17).unwrap()
        );
    }
}
