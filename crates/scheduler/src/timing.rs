//! Cadence helpers (interval/daily/weekly) and the retry-with-backoff
//! wrapper every job loop runs its body through.

use chrono::{Datelike, Local, NaiveTime, Timelike, Weekday};
use common::Error;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Duration until the next `hour:00` in local time (today if it hasn't
/// passed yet, otherwise tomorrow).
pub fn until_next_daily(hour: u32) -> Duration {
    let now = Local::now();
    let mut target = now.date_naive().and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
    if target <= now.naive_local() {
        target += chrono::Duration::days(1);
    }
    (target - now.naive_local()).to_std().unwrap_or(Duration::from_secs(0))
}

/// Duration until the next occurrence of `weekday` at `hour:00` local time.
pub fn until_next_weekly(weekday: Weekday, hour: u32) -> Duration {
    let now = Local::now();
    let mut days_ahead = (weekday.num_days_from_monday() as i64 - now.weekday().num_days_from_monday() as i64 + 7) % 7;
    let mut target = now.date_naive() + chrono::Duration::days(days_ahead);
    let mut target_dt = target.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
    if days_ahead == 0 && target_dt <= now.naive_local() {
        days_ahead = 7;
        target = now.date_naive() + chrono::Duration::days(days_ahead);
        target_dt = target.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
    }
    (target_dt - now.naive_local()).to_std().unwrap_or(Duration::from_secs(0))
}

/// Duration until the next wall-clock minute in `offsets` (e.g. `[5, 35]`)
/// within the current or next hour.
pub fn until_next_minute_offset(offsets: &[u32]) -> Duration {
    let now = Local::now();
    let current_minute = now.minute();
    let mut best: Option<u32> = None;
    for &m in offsets {
        if m > current_minute || (m == current_minute && now.second() == 0) {
            best = Some(best.map_or(m, |b| b.min(m)));
        }
    }
    let target = match best {
        Some(m) => now
            .date_naive()
            .and_time(NaiveTime::from_hms_opt(now.hour(), m, 0).unwrap()),
        None => {
            let next_hour = now.naive_local() + chrono::Duration::hours(1);
            let m = *offsets.iter().min().unwrap_or(&0);
            chrono::NaiveDate::from_ymd_opt(next_hour.year(), next_hour.month(), next_hour.day())
                .unwrap()
                .and_time(NaiveTime::from_hms_opt(next_hour.hour(), m, 0).unwrap())
        }
    };
    (target - now.naive_local()).to_std().unwrap_or(Duration::from_secs(0))
}

/// Runs `body()` under a soft timeout, retrying on failure up to
/// `max_retries` times with a flat `backoff` delay between attempts. A
/// timed-out or erroring attempt is treated identically — this rewrite has
/// no second process to enforce a separate hard timeout, so
/// soft-timeout-exceeded is treated as equivalent to hard-timeout.
pub async fn run_with_retry<F, Fut>(job_name: &str, soft_timeout: Duration, max_retries: u32, backoff: Duration, mut body: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    let mut attempt = 0;
    loop {
        let outcome = tokio::time::timeout(soft_timeout, body()).await;
        match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => warn!(job = job_name, attempt, error = %e, "job attempt failed"),
            Err(_) => warn!(job = job_name, attempt, "job attempt exceeded soft timeout"),
        }

        if attempt >= max_retries {
            error!(job = job_name, attempts = attempt + 1, "job exhausted retries, waiting for next scheduled tick");
            return;
        }
        attempt += 1;
        tokio::time::sleep(backoff).await;
    }
}
