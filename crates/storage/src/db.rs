//! SQLite persistence: connection setup, WAL mode, and the eight-table
//! schema (operator, weather_forecast, prediction, trade, pending_trade,
//! settlement, daily_risk_state, log_entry) with their indices.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create database directory: {}", parent.display()))?;
            }
        }

        let conn = Connection::open(path).with_context(|| format!("failed to open database: {path}"))?;
        let db = Database { conn };
        db.run_migrations()?;
        db.enable_wal()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        let db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn enable_wal(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL").context("failed to enable WAL mode")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS operator (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                encrypted_credentials TEXT NOT NULL,
                trading_mode TEXT NOT NULL DEFAULT 'MANUAL',
                max_trade_size_cents INTEGER NOT NULL,
                daily_loss_limit_cents INTEGER NOT NULL,
                max_daily_exposure_cents INTEGER NOT NULL,
                min_ev_threshold REAL NOT NULL,
                cooldown_minutes_per_loss INTEGER NOT NULL,
                consecutive_loss_limit INTEGER NOT NULL,
                kelly_enabled BOOLEAN NOT NULL DEFAULT 1,
                kelly_fraction REAL NOT NULL DEFAULT 0.25,
                max_bankroll_pct_per_trade REAL NOT NULL DEFAULT 0.05,
                max_contracts_per_trade INTEGER NOT NULL DEFAULT 100,
                active_cities TEXT NOT NULL DEFAULT '[]',
                notifications_enabled BOOLEAN NOT NULL DEFAULT 0,
                push_subscription TEXT,
                demo_mode BOOLEAN NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS weather_forecast (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                target_date TEXT NOT NULL,
                source TEXT NOT NULL,
                forecast_high_f REAL NOT NULL,
                forecast_low_f REAL,
                humidity_pct REAL,
                wind_mph REAL,
                cloud_cover_pct REAL,
                raw_response TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_weather_forecast_city_date ON weather_forecast(city, target_date);

            CREATE TABLE IF NOT EXISTS prediction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                prediction_date TEXT NOT NULL,
                generated_at TEXT NOT NULL,
                ensemble_mean_f REAL NOT NULL,
                ensemble_std_f REAL NOT NULL,
                confidence TEXT NOT NULL,
                model_sources TEXT NOT NULL,
                brackets TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_prediction_city_generated ON prediction(city, generated_at);

            CREATE TABLE IF NOT EXISTS trade (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                operator_id INTEGER NOT NULL,
                market_order_id TEXT,
                city TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                market_ticker TEXT NOT NULL,
                bracket_label TEXT NOT NULL,
                side TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                model_p REAL NOT NULL,
                market_p REAL NOT NULL,
                entry_ev REAL NOT NULL,
                confidence TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'OPEN',
                settlement_temp_f REAL,
                settlement_source TEXT,
                pnl_cents INTEGER,
                fees_cents INTEGER,
                post_mortem TEXT,
                created_at TEXT NOT NULL,
                settled_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_trade_operator_status ON trade(operator_id, status);
            CREATE INDEX IF NOT EXISTS idx_trade_operator_date ON trade(operator_id, trade_date);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_trade_market_order_id ON trade(market_order_id)
                WHERE market_order_id IS NOT NULL;

            CREATE TABLE IF NOT EXISTS pending_trade (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                operator_id INTEGER NOT NULL,
                city TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                market_ticker TEXT NOT NULL,
                bracket_label TEXT NOT NULL,
                side TEXT NOT NULL,
                price_cents INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                model_p REAL NOT NULL,
                market_p REAL NOT NULL,
                entry_ev REAL NOT NULL,
                confidence TEXT NOT NULL,
                reasoning TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING',
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                acted_at TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_pending_trade_status ON pending_trade(status);

            CREATE TABLE IF NOT EXISTS settlement (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                settlement_date TEXT NOT NULL,
                observed_high_f REAL NOT NULL,
                observed_low_f REAL,
                source TEXT NOT NULL,
                raw_report TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(city, settlement_date)
            );
            CREATE INDEX IF NOT EXISTS idx_settlement_city_date ON settlement(city, settlement_date);

            CREATE TABLE IF NOT EXISTS daily_risk_state (
                operator_id INTEGER NOT NULL,
                trading_day TEXT NOT NULL,
                total_loss_cents INTEGER NOT NULL DEFAULT 0,
                total_exposure_cents INTEGER NOT NULL DEFAULT 0,
                consecutive_losses INTEGER NOT NULL DEFAULT 0,
                cooldown_until TEXT,
                trades_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (operator_id, trading_day)
            );

            CREATE TABLE IF NOT EXISTS log_entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                level TEXT NOT NULL,
                target TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_log_entry_created_at ON log_entry(created_at);
            ",
            )
            .context("failed to run database migrations")?;

        // Added when post-mortem generation was introduced; idempotent for
        // databases created before this column existed.
        let _ = self.conn.execute("ALTER TABLE trade ADD COLUMN post_mortem TEXT", []);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_with_all_eight_tables() {
        let db = Database::open_in_memory().unwrap();
        let tables: Vec<String> = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for expected in [
            "operator",
            "weather_forecast",
            "prediction",
            "trade",
            "pending_trade",
            "settlement",
            "daily_risk_state",
            "log_entry",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {expected}");
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().unwrap();
    }
}
