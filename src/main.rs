//! Automated Kalshi daily-high-temperature trading agent.
//!
//! Single-binary Tokio application that:
//! 1. Fetches NWS/Open-Meteo forecasts and NWS CLI settlement reports
//! 2. Runs an ensemble regressor over fused forecasts to produce bracket
//!    probabilities
//! 3. Compares model probability against live Kalshi prices, sizes and
//!    risk-gates any edge, and executes or queues the resulting trade
//! 4. Settles trades once the day's high is on record and retrains weekly
//! 5. Serves a dashboard WebSocket feed of everything it does

mod config;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::RwLock;
use tracing::{error, info};

use common::AppConfig;
use events::{new_event_channel, ws_handler, ConnectionManager, WsState};
use market::kalshi::auth::KalshiAuth;
use market::kalshi::rest::KalshiGateway;
use market::paper::PaperGateway;
use market::MarketGateway;
use prediction::ensemble::{Ensemble, EnsembleMember};
use prediction::regressor::RidgeRegressor;
use scheduler::context::JobContext;
use storage::Database;
use weather::grid_cache::GridCache;
use weather::rate_limit::RateLimiters;

/// Kalshi daily-high-temperature trading agent.
#[derive(Parser)]
#[command(name = "boz-weather-trader", about = "Kalshi daily-high-temperature trading agent")]
struct Cli {
    /// Path to config.toml. Defaults to `config.toml` in the working directory if present.
    #[arg(long)]
    config: Option<String>,

    /// Load configuration, print a summary, and exit without spawning any job.
    #[arg(long)]
    check_config: bool,

    /// Force paper-trading mode regardless of `demo_mode` in the operator row.
    #[arg(long)]
    dry_run: bool,
}

#[derive(serde::Deserialize)]
struct OperatorCredentials {
    api_key: String,
    private_key_pem: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.log_level.clone())))
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(cities = ?cfg.cities.iter().map(|c| c.city.code()).collect::<Vec<_>>(), "starting up");

    if cli.check_config {
        info!(database_path = %cfg.database_path, http_bind_addr = %cfg.http_bind_addr, "configuration is valid");
        return;
    }

    if let Err(e) = run(cfg, cli.dry_run).await {
        error!(error = %e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run(cfg: AppConfig, force_paper: bool) -> anyhow::Result<()> {
    let db = Database::open(&cfg.database_path)?;
    let db = storage::shared(db);

    let operator = storage::with_db(&db, |db| db.get_singleton_operator()).await.ok().flatten();

    let (gateway, operator_id): (Arc<dyn MarketGateway>, i64) = match &operator {
        Some(op) if !force_paper && !op.demo_mode => {
            let creds: OperatorCredentials = serde_json::from_str(&common::crypto::decrypt(&cfg.encryption_master_key, &op.encrypted_credentials)?)?;
            let auth = KalshiAuth::new(&creds.api_key, &creds.private_key_pem)?;
            (Arc::new(KalshiGateway::new(auth, false)), op.id)
        }
        Some(op) => (Arc::new(PaperGateway::new(op.max_daily_exposure_cents.max(100_000))), op.id),
        None => {
            info!("no operator configured yet, running in paper mode against a zero-balance gateway");
            (Arc::new(PaperGateway::new(0)), 0)
        }
    };

    let ensemble = Arc::new(RwLock::new(Ensemble::new(vec![EnsembleMember { regressor: Box::new(RidgeRegressor::new(0.1)), rmse: 5.0 }])));
    {
        let mut guard = ensemble.write().await;
        for member in guard.members_mut() {
            let path = std::path::Path::new(&cfg.models_dir).join(format!("{}.json", member.regressor.name()));
            member.regressor.load(&path);
        }
    }

    let events_tx = new_event_channel();
    let connections = ConnectionManager::new();

    let ctx = JobContext {
        db: db.clone(),
        gateway,
        ensemble,
        events: events_tx.clone(),
        grid_cache: GridCache::new(),
        rate_limiters: RateLimiters::new(cfg.nws_rate_limit_per_sec, cfg.open_meteo_rate_limit_per_sec),
        config: Arc::new(cfg.clone()),
        operator_id,
    };

    let _job_handles = scheduler::spawn_all(ctx);

    let ws_state = WsState { tx: events_tx, connections };
    let app = axum::Router::new().route("/ws", axum::routing::get(ws_handler)).with_state(ws_state);
    let listener = tokio::net::TcpListener::bind(&cfg.http_bind_addr).await?;
    info!(addr = %cfg.http_bind_addr, "dashboard websocket listening");
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "dashboard server exited");
        }
    });

    info!("agent is running, press Ctrl+C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
        _ = server_handle => {
            error!("dashboard server task exited unexpectedly");
        }
    }

    Ok(())
}
