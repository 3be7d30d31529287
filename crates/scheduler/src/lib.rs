//! Spawns the seven long-lived job loops that drive the trading agent,
//! each on its own cadence, soft timeout, and retry budget, collapsing the
//! beat/worker/broker model to one `tokio::spawn` per job.

pub mod context;
pub mod features;
pub mod jobs;
pub mod timing;

use chrono::Weekday;
use context::JobContext;
use std::time::Duration;
use timing::{run_with_retry, until_next_daily, until_next_minute_offset, until_next_weekly};
use tokio::task::JoinHandle;
use tracing::info;

/// Spawns every job loop and returns their handles so the caller can await
/// them as part of its own shutdown selection.
pub fn spawn_all(ctx: JobContext) -> Vec<JoinHandle<()>> {
    vec![
        spawn_interval("fetch_forecasts", ctx.clone(), Duration::from_secs(30 * 60), Duration::from_secs(240), 3, Duration::from_secs(60), |ctx| {
            Box::pin(async move { jobs::fetch_forecasts::run_once(&ctx).await })
        }),
        spawn_daily("fetch_cli_reports", ctx.clone(), 8, Duration::from_secs(240), 3, Duration::from_secs(120), |ctx| {
            Box::pin(async move { jobs::fetch_cli_reports::run_once(&ctx).await })
        }),
        spawn_minute_offsets("generate_predictions", ctx.clone(), &[5, 35], Duration::from_secs(240), 2, Duration::from_secs(60), |ctx| {
            Box::pin(async move { jobs::generate_predictions::run_once(&ctx).await })
        }),
        spawn_interval("trading_cycle", ctx.clone(), Duration::from_secs(15 * 60), Duration::from_secs(180), 2, Duration::from_secs(30), |ctx| {
            Box::pin(async move { jobs::trading_cycle::run_once(&ctx).await })
        }),
        spawn_interval("expire_pending", ctx.clone(), Duration::from_secs(5 * 60), Duration::from_secs(120), 0, Duration::from_secs(0), |ctx| {
            Box::pin(async move { jobs::expire_pending::run_once(&ctx).await })
        }),
        spawn_daily("settle_trades", ctx.clone(), 9, Duration::from_secs(300), 2, Duration::from_secs(60), |ctx| {
            Box::pin(async move { jobs::settle_trades::run_once(&ctx).await })
        }),
        spawn_weekly("train_models", ctx, Weekday::Sun, 3, Duration::from_secs(600), 0, Duration::from_secs(0), |ctx| {
            Box::pin(async move { jobs::train_models::run_once(&ctx).await })
        }),
    ]
}

type JobFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), common::Error>> + Send>>;

fn spawn_interval<F>(
    name: &'static str,
    ctx: JobContext,
    every: Duration,
    soft_timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    body: F,
) -> JoinHandle<()>
where
    F: Fn(JobContext) -> JobFuture + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(job = name, "job loop started");
        let mut tick = tokio::time::interval(every);
        loop {
            tick.tick().await;
            let ctx = ctx.clone();
            run_with_retry(name, soft_timeout, max_retries, backoff, || body(ctx.clone())).await;
        }
    })
}

fn spawn_daily<F>(name: &'static str, ctx: JobContext, hour: u32, soft_timeout: Duration, max_retries: u32, backoff: Duration, body: F) -> JoinHandle<()>
where
    F: Fn(JobContext) -> JobFuture + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(job = name, "job loop started");
        loop {
            tokio::time::sleep(until_next_daily(hour)).await;
            let ctx = ctx.clone();
            run_with_retry(name, soft_timeout, max_retries, backoff, || body(ctx.clone())).await;
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn spawn_weekly<F>(
    name: &'static str,
    ctx: JobContext,
    weekday: Weekday,
    hour: u32,
    soft_timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    body: F,
) -> JoinHandle<()>
where
    F: Fn(JobContext) -> JobFuture + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(job = name, "job loop started");
        loop {
            tokio::time::sleep(until_next_weekly(weekday, hour)).await;
            let ctx = ctx.clone();
            run_with_retry(name, soft_timeout, max_retries, backoff, || body(ctx.clone())).await;
        }
    })
}

fn spawn_minute_offsets<F>(
    name: &'static str,
    ctx: JobContext,
    offsets: &'static [u32],
    soft_timeout: Duration,
    max_retries: u32,
    backoff: Duration,
    body: F,
) -> JoinHandle<()>
where
    F: Fn(JobContext) -> JobFuture + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(job = name, "job loop started");
        loop {
            tokio::time::sleep(until_next_minute_offset(offsets)).await;
            let ctx = ctx.clone();
            run_with_retry(name, soft_timeout, max_retries, backoff, || body(ctx.clone())).await;
        }
    })
}
