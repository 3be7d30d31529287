//! Typed CRUD over the eight tables, translating to/from the shared
//! domain types. Enum columns round-trip through their `serde` JSON
//! representation so a new enum variant never needs a second mapping.

use crate::db::Database;
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    BracketProbability, City, Confidence, DailyRiskState, Error, Operator, PendingStatus,
    PendingTrade, Prediction, Settlement, Side, Trade, TradeStatus, WeatherForecast, WeatherSource,
};
use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

fn enum_to_str<T: Serialize>(v: &T) -> String {
    let json = serde_json::to_string(v).expect("enum serializes to a JSON string");
    json.trim_matches('"').to_string()
}

fn str_to_enum<T: DeserializeOwned>(s: &str) -> Result<T, Error> {
    serde_json::from_str(&format!("\"{s}\"")).map_err(|e| Error::Storage(format!("bad enum value {s}: {e}")))
}

impl Database {
    // ── operator ──────────────────────────────────────────────────────

    pub fn insert_operator(&self, op: &Operator) -> Result<i64, Error> {
        self.conn
            .execute(
                "INSERT INTO operator (encrypted_credentials, trading_mode, max_trade_size_cents,
                    daily_loss_limit_cents, max_daily_exposure_cents, min_ev_threshold,
                    cooldown_minutes_per_loss, consecutive_loss_limit, kelly_enabled, kelly_fraction,
                    max_bankroll_pct_per_trade, max_contracts_per_trade, active_cities,
                    notifications_enabled, push_subscription, demo_mode)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
                params![
                    op.encrypted_credentials,
                    enum_to_str(&op.trading_mode),
                    op.max_trade_size_cents,
                    op.daily_loss_limit_cents,
                    op.max_daily_exposure_cents,
                    op.min_ev_threshold,
                    op.cooldown_minutes_per_loss,
                    op.consecutive_loss_limit,
                    op.kelly_enabled,
                    op.kelly_fraction,
                    op.max_bankroll_pct_per_trade,
                    op.max_contracts_per_trade,
                    serde_json::to_string(&op.active_cities).unwrap(),
                    op.notifications_enabled,
                    op.push_subscription,
                    op.demo_mode,
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_operator(&self, id: i64) -> Result<Option<Operator>, Error> {
        self.conn
            .query_row(
                "SELECT id, encrypted_credentials, trading_mode, max_trade_size_cents,
                    daily_loss_limit_cents, max_daily_exposure_cents, min_ev_threshold,
                    cooldown_minutes_per_loss, consecutive_loss_limit, kelly_enabled, kelly_fraction,
                    max_bankroll_pct_per_trade, max_contracts_per_trade, active_cities,
                    notifications_enabled, push_subscription, demo_mode
                 FROM operator WHERE id = ?1",
                [id],
                |row| {
                    let active_cities_json: String = row.get(13)?;
                    Ok(Operator {
                        id: row.get(0)?,
                        encrypted_credentials: row.get(1)?,
                        trading_mode: str_to_enum(&row.get::<_, String>(2)?).unwrap(),
                        max_trade_size_cents: row.get(3)?,
                        daily_loss_limit_cents: row.get(4)?,
                        max_daily_exposure_cents: row.get(5)?,
                        min_ev_threshold: row.get(6)?,
                        cooldown_minutes_per_loss: row.get(7)?,
                        consecutive_loss_limit: row.get(8)?,
                        kelly_enabled: row.get(9)?,
                        kelly_fraction: row.get(10)?,
                        max_bankroll_pct_per_trade: row.get(11)?,
                        max_contracts_per_trade: row.get(12)?,
                        active_cities: serde_json::from_str(&active_cities_json).unwrap_or_default(),
                        notifications_enabled: row.get(14)?,
                        push_subscription: row.get(15)?,
                        demo_mode: row.get(16)?,
                    })
                },
            )
            .optional()
            .map_err(|e| Error::Storage(e.to_string()))
    }

    /// There's exactly one operator row in the common deployment shape;
    /// this returns the lowest-id row if more than one exists.
    pub fn get_singleton_operator(&self) -> Result<Option<Operator>, Error> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT id FROM operator ORDER BY id ASC LIMIT 1", [], |row| row.get(0))
            .optional()
            .map_err(|e| Error::Storage(e.to_string()))?;
        match id {
            Some(id) => self.get_operator(id),
            None => Ok(None),
        }
    }

    // ── weather_forecast ──────────────────────────────────────────────

    pub fn insert_weather_forecast(&self, fc: &WeatherForecast) -> Result<i64, Error> {
        self.conn
            .execute(
                "INSERT INTO weather_forecast (city, target_date, source, forecast_high_f,
                    forecast_low_f, humidity_pct, wind_mph, cloud_cover_pct, raw_response, fetched_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
                params![
                    enum_to_str(&fc.city),
                    fc.target_date.to_string(),
                    enum_to_str(&fc.source),
                    fc.forecast_high_f,
                    fc.forecast_low_f,
                    fc.humidity_pct,
                    fc.wind_mph,
                    fc.cloud_cover_pct,
                    fc.raw_response,
                    fc.fetched_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_forecasts_for(&self, city: City, date: NaiveDate) -> Result<Vec<WeatherForecast>, Error> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, city, target_date, source, forecast_high_f, forecast_low_f,
                    humidity_pct, wind_mph, cloud_cover_pct, raw_response, fetched_at
                 FROM weather_forecast WHERE city = ?1 AND target_date = ?2",
            )
            .map_err(|e| Error::Storage(e.to_string()))?;

        let rows = stmt
            .query_map(params![enum_to_str(&city), date.to_string()], |row| {
                Ok(WeatherForecast {
                    id: row.get(0)?,
                    city: str_to_enum(&row.get::<_, String>(1)?).unwrap(),
                    target_date: row.get::<_, String>(2)?.parse().unwrap(),
                    source: str_to_enum(&row.get::<_, String>(3)?).unwrap(),
                    forecast_high_f: row.get(4)?,
                    forecast_low_f: row.get(5)?,
                    humidity_pct: row.get(6)?,
                    wind_mph: row.get(7)?,
                    cloud_cover_pct: row.get(8)?,
                    raw_response: row.get(9)?,
                    fetched_at: row.get::<_, String>(10)?.parse::<DateTime<Utc>>().unwrap(),
                })
            })
            .map_err(|e| Error::Storage(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| Error::Storage(e.to_string()))
    }

    // ── prediction ────────────────────────────────────────────────────

    pub fn insert_prediction(&self, p: &Prediction) -> Result<i64, Error> {
        self.conn
            .execute(
                "INSERT INTO prediction (city, prediction_date, generated_at, ensemble_mean_f,
                    ensemble_std_f, confidence, model_sources, brackets)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
                params![
                    enum_to_str(&p.city),
                    p.prediction_date.to_string(),
                    p.generated_at.to_rfc3339(),
                    p.ensemble_mean_f,
                    p.ensemble_std_f,
                    enum_to_str(&p.confidence),
                    serde_json::to_string(&p.model_sources).unwrap(),
                    serde_json::to_string(&p.brackets).unwrap(),
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_latest_prediction(&self, city: City, date: NaiveDate) -> Result<Option<Prediction>, Error> {
        self.conn
            .query_row(
                "SELECT id, city, prediction_date, generated_at, ensemble_mean_f, ensemble_std_f,
                    confidence, model_sources, brackets
                 FROM prediction WHERE city = ?1 AND prediction_date = ?2
                 ORDER BY generated_at DESC LIMIT 1",
                params![enum_to_str(&city), date.to_string()],
                |row| {
                    let model_sources: String = row.get(7)?;
                    let brackets_json: String = row.get(8)?;
                    Ok(Prediction {
                        id: row.get(0)?,
                        city: str_to_enum(&row.get::<_, String>(1)?).unwrap(),
                        prediction_date: row.get::<_, String>(2)?.parse().unwrap(),
                        generated_at: row.get::<_, String>(3)?.parse::<DateTime<Utc>>().unwrap(),
                        ensemble_mean_f: row.get(4)?,
                        ensemble_std_f: row.get(5)?,
                        confidence: str_to_enum(&row.get::<_, String>(6)?).unwrap(),
                        model_sources: serde_json::from_str(&model_sources).unwrap_or_default(),
                        brackets: serde_json::from_str::<Vec<BracketProbability>>(&brackets_json).unwrap_or_default(),
                    })
                },
            )
            .optional()
            .map_err(|e| Error::Storage(e.to_string()))
    }

    // ── trade ─────────────────────────────────────────────────────────

    pub fn insert_trade(&self, t: &Trade) -> Result<i64, Error> {
        self.conn
            .execute(
                "INSERT INTO trade (operator_id, market_order_id, city, trade_date, market_ticker,
                    bracket_label, side, price_cents, quantity, model_p, market_p, entry_ev,
                    confidence, status, created_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
                params![
                    t.operator_id,
                    t.market_order_id,
                    enum_to_str(&t.city),
                    t.trade_date.to_string(),
                    t.market_ticker,
                    t.bracket_label,
                    enum_to_str(&t.side),
                    t.price_cents,
                    t.quantity,
                    t.model_p,
                    t.market_p,
                    t.entry_ev,
                    enum_to_str(&t.confidence),
                    enum_to_str(&t.status),
                    t.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn settle_trade(
        &self,
        id: i64,
        status: TradeStatus,
        settlement_temp_f: f64,
        settlement_source: &str,
        pnl_cents: i64,
        fees_cents: i64,
        post_mortem: &str,
        settled_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.conn
            .execute(
                "UPDATE trade SET status = ?1, settlement_temp_f = ?2, settlement_source = ?3,
                    pnl_cents = ?4, fees_cents = ?5, post_mortem = ?6, settled_at = ?7 WHERE id = ?8",
                params![
                    enum_to_str(&status),
                    settlement_temp_f,
                    settlement_source,
                    pnl_cents,
                    fees_cents,
                    post_mortem,
                    settled_at.to_rfc3339(),
                    id,
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_open_trades(&self) -> Result<Vec<Trade>, Error> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, operator_id, market_order_id, city, trade_date, market_ticker,
                    bracket_label, side, price_cents, quantity, model_p, market_p, entry_ev,
                    confidence, status, settlement_temp_f, settlement_source, pnl_cents,
                    fees_cents, post_mortem, created_at, settled_at
                 FROM trade WHERE status = 'OPEN'",
            )
            .map_err(|e| Error::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_trade)
            .map_err(|e| Error::Storage(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| Error::Storage(e.to_string()))
    }

    fn row_to_trade(row: &rusqlite::Row) -> rusqlite::Result<Trade> {
        Ok(Trade {
            id: row.get(0)?,
            operator_id: row.get(1)?,
            market_order_id: row.get(2)?,
            city: str_to_enum(&row.get::<_, String>(3)?).unwrap(),
            trade_date: row.get::<_, String>(4)?.parse().unwrap(),
            market_ticker: row.get(5)?,
            bracket_label: row.get(6)?,
            side: str_to_enum(&row.get::<_, String>(7)?).unwrap(),
            price_cents: row.get(8)?,
            quantity: row.get(9)?,
            model_p: row.get(10)?,
            market_p: row.get(11)?,
            entry_ev: row.get(12)?,
            confidence: str_to_enum(&row.get::<_, String>(13)?).unwrap(),
            status: str_to_enum(&row.get::<_, String>(14)?).unwrap(),
            settlement_temp_f: row.get(15)?,
            settlement_source: row.get(16)?,
            pnl_cents: row.get(17)?,
            fees_cents: row.get(18)?,
            post_mortem: row.get(19)?,
            created_at: row.get::<_, String>(20)?.parse::<DateTime<Utc>>().unwrap(),
            settled_at: row.get::<_, Option<String>>(21)?.map(|s| s.parse::<DateTime<Utc>>().unwrap()),
        })
    }

    // ── pending_trade ─────────────────────────────────────────────────

    pub fn insert_pending_trade(&self, pt: &PendingTrade) -> Result<i64, Error> {
        self.conn
            .execute(
                "INSERT INTO pending_trade (operator_id, city, trade_date, market_ticker,
                    bracket_label, side, price_cents, quantity, model_p, market_p, entry_ev,
                    confidence, reasoning, status, created_at, expires_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
                params![
                    pt.operator_id,
                    enum_to_str(&pt.city),
                    pt.trade_date.to_string(),
                    pt.market_ticker,
                    pt.bracket_label,
                    enum_to_str(&pt.side),
                    pt.price_cents,
                    pt.quantity,
                    pt.model_p,
                    pt.market_p,
                    pt.entry_ev,
                    enum_to_str(&pt.confidence),
                    pt.reasoning,
                    enum_to_str(&pt.status),
                    pt.created_at.to_rfc3339(),
                    pt.expires_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_pending_trade_status(&self, id: i64, status: PendingStatus, acted_at: DateTime<Utc>) -> Result<(), Error> {
        self.conn
            .execute(
                "UPDATE pending_trade SET status = ?1, acted_at = ?2 WHERE id = ?3",
                params![enum_to_str(&status), acted_at.to_rfc3339(), id],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_pending_trades_by_status(&self, status: PendingStatus) -> Result<Vec<PendingTrade>, Error> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, operator_id, city, trade_date, market_ticker, bracket_label, side,
                    price_cents, quantity, model_p, market_p, entry_ev, confidence, reasoning,
                    status, created_at, expires_at, acted_at
                 FROM pending_trade WHERE status = ?1",
            )
            .map_err(|e| Error::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([enum_to_str(&status)], |row| {
                Ok(PendingTrade {
                    id: row.get(0)?,
                    operator_id: row.get(1)?,
                    city: str_to_enum(&row.get::<_, String>(2)?).unwrap(),
                    trade_date: row.get::<_, String>(3)?.parse().unwrap(),
                    market_ticker: row.get(4)?,
                    bracket_label: row.get(5)?,
                    side: str_to_enum(&row.get::<_, String>(6)?).unwrap(),
                    price_cents: row.get(7)?,
                    quantity: row.get(8)?,
                    model_p: row.get(9)?,
                    market_p: row.get(10)?,
                    entry_ev: row.get(11)?,
                    confidence: str_to_enum(&row.get::<_, String>(12)?).unwrap(),
                    reasoning: row.get(13)?,
                    status: str_to_enum(&row.get::<_, String>(14)?).unwrap(),
                    created_at: row.get::<_, String>(15)?.parse::<DateTime<Utc>>().unwrap(),
                    expires_at: row.get::<_, String>(16)?.parse::<DateTime<Utc>>().unwrap(),
                    acted_at: row.get::<_, Option<String>>(17)?.map(|s| s.parse::<DateTime<Utc>>().unwrap()),
                })
            })
            .map_err(|e| Error::Storage(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(|e| Error::Storage(e.to_string()))
    }

    // ── settlement ────────────────────────────────────────────────────

    pub fn upsert_settlement(&self, s: &Settlement) -> Result<(), Error> {
        self.conn
            .execute(
                "INSERT INTO settlement (city, settlement_date, observed_high_f, observed_low_f,
                    source, raw_report, created_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)
                 ON CONFLICT(city, settlement_date) DO UPDATE SET
                    observed_high_f = excluded.observed_high_f,
                    observed_low_f = excluded.observed_low_f,
                    source = excluded.source,
                    raw_report = excluded.raw_report",
                params![
                    enum_to_str(&s.city),
                    s.settlement_date.to_string(),
                    s.observed_high_f,
                    s.observed_low_f,
                    s.source,
                    s.raw_report,
                    s.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_settlement(&self, city: City, date: NaiveDate) -> Result<Option<Settlement>, Error> {
        self.conn
            .query_row(
                "SELECT id, city, settlement_date, observed_high_f, observed_low_f, source,
                    raw_report, created_at
                 FROM settlement WHERE city = ?1 AND settlement_date = ?2",
                params![enum_to_str(&city), date.to_string()],
                |row| {
                    Ok(Settlement {
                        id: row.get(0)?,
                        city: str_to_enum(&row.get::<_, String>(1)?).unwrap(),
                        settlement_date: row.get::<_, String>(2)?.parse().unwrap(),
                        observed_high_f: row.get(3)?,
                        observed_low_f: row.get(4)?,
                        source: row.get(5)?,
                        raw_report: row.get(6)?,
                        created_at: row.get::<_, String>(7)?.parse::<DateTime<Utc>>().unwrap(),
                    })
                },
            )
            .optional()
            .map_err(|e| Error::Storage(e.to_string()))
    }

    // ── daily_risk_state ──────────────────────────────────────────────

    pub fn get_daily_risk_state(&self, operator_id: i64, trading_day: NaiveDate) -> Result<Option<DailyRiskState>, Error> {
        self.conn
            .query_row(
                "SELECT operator_id, trading_day, total_loss_cents, total_exposure_cents,
                    consecutive_losses, cooldown_until, trades_count
                 FROM daily_risk_state WHERE operator_id = ?1 AND trading_day = ?2",
                params![operator_id, trading_day.to_string()],
                |row| {
                    Ok(DailyRiskState {
                        operator_id: row.get(0)?,
                        trading_day: row.get::<_, String>(1)?.parse().unwrap(),
                        total_loss_cents: row.get(2)?,
                        total_exposure_cents: row.get(3)?,
                        consecutive_losses: row.get(4)?,
                        cooldown_until: row.get::<_, Option<String>>(5)?.map(|s| s.parse::<DateTime<Utc>>().unwrap()),
                        trades_count: row.get(6)?,
                    })
                },
            )
            .optional()
            .map_err(|e| Error::Storage(e.to_string()))
    }

    pub fn upsert_daily_risk_state(&self, s: &DailyRiskState) -> Result<(), Error> {
        self.conn
            .execute(
                "INSERT INTO daily_risk_state (operator_id, trading_day, total_loss_cents,
                    total_exposure_cents, consecutive_losses, cooldown_until, trades_count)
                 VALUES (?1,?2,?3,?4,?5,?6,?7)
                 ON CONFLICT(operator_id, trading_day) DO UPDATE SET
                    total_loss_cents = excluded.total_loss_cents,
                    total_exposure_cents = excluded.total_exposure_cents,
                    consecutive_losses = excluded.consecutive_losses,
                    cooldown_until = excluded.cooldown_until,
                    trades_count = excluded.trades_count",
                params![
                    s.operator_id,
                    s.trading_day.to_string(),
                    s.total_loss_cents,
                    s.total_exposure_cents,
                    s.consecutive_losses,
                    s.cooldown_until.map(|t| t.to_rfc3339()),
                    s.trades_count,
                ],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    // ── log_entry ─────────────────────────────────────────────────────

    pub fn insert_log_entry(&self, level: &str, target: &str, message: &str, created_at: DateTime<Utc>) -> Result<(), Error> {
        self.conn
            .execute(
                "INSERT INTO log_entry (level, target, message, created_at) VALUES (?1,?2,?3,?4)",
                params![level, target, message, created_at.to_rfc3339()],
            )
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Action, TradingMode};

    fn sample_operator() -> Operator {
        Operator {
            id: 0,
            encrypted_credentials: "ciphertext".into(),
            trading_mode: TradingMode::Auto,
            max_trade_size_cents: 5_000,
            daily_loss_limit_cents: 10_000,
            max_daily_exposure_cents: 20_000,
            min_ev_threshold: 0.02,
            cooldown_minutes_per_loss: 30,
            consecutive_loss_limit: 3,
            kelly_enabled: true,
            kelly_fraction: 0.25,
            max_bankroll_pct_per_trade: 0.05,
            max_contracts_per_trade: 200,
            active_cities: vec![City::Nyc, City::Chi],
            notifications_enabled: true,
            push_subscription: None,
            demo_mode: true,
        }
    }

    #[test]
    fn round_trips_an_operator() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_operator(&sample_operator()).unwrap();
        let loaded = db.get_operator(id).unwrap().unwrap();
        assert_eq!(loaded.active_cities, vec![City::Nyc, City::Chi]);
        assert_eq!(loaded.trading_mode, TradingMode::Auto);
    }

    #[test]
    fn round_trips_a_weather_forecast() {
        let db = Database::open_in_memory().unwrap();
        let fc = WeatherForecast {
            id: 0,
            city: City::Nyc,
            target_date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            source: WeatherSource::Nws,
            forecast_high_f: 55.0,
            forecast_low_f: Some(40.0),
            humidity_pct: Some(60.0),
            wind_mph: Some(8.0),
            cloud_cover_pct: Some(20.0),
            raw_response: "{}".into(),
            fetched_at: Utc::now(),
        };
        db.insert_weather_forecast(&fc).unwrap();
        let loaded = db.get_forecasts_for(City::Nyc, fc.target_date).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].forecast_high_f, 55.0);
    }

    #[test]
    fn settlement_upsert_is_idempotent_per_city_date() {
        let db = Database::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let mk = |high: f64| Settlement {
            id: 0,
            city: City::Nyc,
            settlement_date: date,
            observed_high_f: high,
            observed_low_f: None,
            source: "NWS CLI".into(),
            raw_report: "...".into(),
            created_at: Utc::now(),
        };
        db.upsert_settlement(&mk(54.0)).unwrap();
        db.upsert_settlement(&mk(55.0)).unwrap();
        let loaded = db.get_settlement(City::Nyc, date).unwrap().unwrap();
        assert_eq!(loaded.observed_high_f, 55.0);
    }

    #[test]
    fn daily_risk_state_round_trips_and_upserts() {
        let db = Database::open_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        let mut state = DailyRiskState::fresh(1, date);
        state.total_loss_cents = 500;
        db.upsert_daily_risk_state(&state).unwrap();

        let loaded = db.get_daily_risk_state(1, date).unwrap().unwrap();
        assert_eq!(loaded.total_loss_cents, 500);

        state.total_loss_cents = 1500;
        db.upsert_daily_risk_state(&state).unwrap();
        let loaded = db.get_daily_risk_state(1, date).unwrap().unwrap();
        assert_eq!(loaded.total_loss_cents, 1500);
    }

    #[test]
    fn trade_lifecycle_insert_then_settle() {
        let db = Database::open_in_memory().unwrap();
        let trade = Trade {
            id: 0,
            operator_id: 1,
            market_order_id: Some("ord-1".into()),
            city: City::Nyc,
            trade_date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            market_ticker: "KXHIGHNY-26FEB18-B54".into(),
            bracket_label: "54-58".into(),
            side: Side::Yes,
            price_cents: 57,
            quantity: 20,
            model_p: 0.65,
            market_p: 0.57,
            entry_ev: 0.08,
            confidence: Confidence::High,
            status: TradeStatus::Open,
            settlement_temp_f: None,
            settlement_source: None,
            pnl_cents: None,
            fees_cents: None,
            post_mortem: None,
            created_at: Utc::now(),
            settled_at: None,
        };
        let id = db.insert_trade(&trade).unwrap();
        assert_eq!(db.get_open_trades().unwrap().len(), 1);

        db.settle_trade(id, TradeStatus::Won, 56.0, "NWS CLI", 78, 7, "won the bracket", Utc::now()).unwrap();
        assert_eq!(db.get_open_trades().unwrap().len(), 0);

        let _ = Action::Buy; // silence unused import in case side/action split further
    }

    #[test]
    fn pending_trade_status_transitions() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let pt = PendingTrade {
            id: 0,
            operator_id: 1,
            city: City::Nyc,
            trade_date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            market_ticker: "KXHIGHNY-26FEB18-B54".into(),
            bracket_label: "54-58".into(),
            side: Side::Yes,
            price_cents: 57,
            quantity: 10,
            model_p: 0.65,
            market_p: 0.57,
            entry_ev: 0.08,
            confidence: Confidence::Medium,
            reasoning: "model favors upper bracket".into(),
            status: PendingStatus::Pending,
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
            acted_at: None,
        };
        let id = db.insert_pending_trade(&pt).unwrap();
        assert_eq!(db.get_pending_trades_by_status(PendingStatus::Pending).unwrap().len(), 1);

        db.update_pending_trade_status(id, PendingStatus::Approved, Utc::now()).unwrap();
        assert_eq!(db.get_pending_trades_by_status(PendingStatus::Pending).unwrap().len(), 0);
        assert_eq!(db.get_pending_trades_by_status(PendingStatus::Approved).unwrap().len(), 1);
    }
}
