//! HTTP fetch-with-retry, JSON and raw-text variants.
//!
//! For every attempt: acquire a rate-limit token, open a fresh client,
//! GET with a 30s timeout; on 5xx or transport error wait `2^attempt`
//! seconds and retry (default `max_retries = 3`); on 4xx fail immediately;
//! exhausting retries raises `Error::Fetch`. Grounded in
//! `jcarlin-polymarket-agent/src/weather_client.rs`'s retry loop,
//! generalized into a shared helper for every weather source.

use common::Error;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

use crate::rate_limit::HostRateLimiter;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

fn client() -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| Error::Http(e.to_string()))
}

async fn fetch_with_retry_raw(
    url: &str,
    user_agent: Option<&str>,
    limiter: &HostRateLimiter,
    max_retries: u32,
) -> Result<String, Error> {
    let http = client()?;
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(2u64.pow(attempt));
            warn!(attempt, ?delay, url, "retrying fetch after backoff");
            tokio::time::sleep(delay).await;
        }

        limiter.acquire().await;

        let mut req = http.get(url);
        if let Some(ua) = user_agent {
            req = req.header(reqwest::header::USER_AGENT, ua);
        }

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return resp.text().await.map_err(|e| Error::Fetch(e.to_string()));
                }
                let code = status.as_u16();
                let body = resp.text().await.unwrap_or_default();
                if code >= 500 {
                    warn!(code, url, "5xx response, will retry");
                    last_err = Some(Error::Fetch(format!("{code}: {body}")));
                    continue;
                }
                // 4xx is not retryable.
                return Err(Error::Fetch(format!("{code}: {body}")));
            }
            Err(e) => {
                warn!(url, error = %e, "transport error, will retry");
                last_err = Some(Error::Fetch(e.to_string()));
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::Fetch("exhausted retries".into())))
}

/// Fetch a URL and parse the body as JSON, with retry semantics.
pub async fn fetch_json<T: DeserializeOwned>(
    url: &str,
    user_agent: Option<&str>,
    limiter: &HostRateLimiter,
    max_retries: u32,
) -> Result<T, Error> {
    let text = fetch_with_retry_raw(url, user_agent, limiter, max_retries).await?;
    serde_json::from_str(&text).map_err(Error::Json)
}

/// Fetch a URL and return the raw text body, with retry semantics (used for
/// the NWS CLI product, which is plain text).
pub async fn fetch_text(
    url: &str,
    user_agent: Option<&str>,
    limiter: &HostRateLimiter,
    max_retries: u32,
) -> Result<String, Error> {
    fetch_with_retry_raw(url, user_agent, limiter, max_retries).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn succeeds_without_retry_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let limiter = HostRateLimiter::new(100.0);
        let text = fetch_text(&server.uri(), None, &limiter, 3).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn fails_immediately_on_4xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let limiter = HostRateLimiter::new(100.0);
        let result = fetch_text(&server.uri(), None, &limiter, 3).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn exhausts_retries_on_persistent_5xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3) // 1 initial + 2 retries when max_retries=2
            .mount(&server)
            .await;

        let limiter = HostRateLimiter::new(100.0);
        let result = fetch_text(&server.uri(), None, &limiter, 2).await;
        assert!(result.is_err());
    }
}
