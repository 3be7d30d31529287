//! Grid-coordinate cache.
//!
//! A per-city lookup against `/points/{lat},{lon}` returns `(office, x, y)`;
//! cached in-memory for the process lifetime since coordinates are
//! geographic constants. Populated lazily under a per-key lock.

use common::{City, Error};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::rate_limit::HostRateLimiter;

#[derive(Debug, Clone, Copy)]
pub struct GridPoint {
    pub office: &'static str,
    pub grid_x: u32,
    pub grid_y: u32,
}

#[derive(Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Deserialize)]
struct PointsProperties {
    #[serde(rename = "gridId")]
    grid_id: String,
    #[serde(rename = "gridX")]
    grid_x: u32,
    #[serde(rename = "gridY")]
    grid_y: u32,
}

/// Process-lifetime cache of city -> grid point. Four entries, unbounded,
/// low contention — a plain `RwLock<HashMap>` is sufficient.
#[derive(Clone)]
pub struct GridCache {
    inner: Arc<RwLock<HashMap<City, GridPoint>>>,
}

// `gridId` leaks as a 'static str via a small fixed intern table — NWS
// office codes are a closed set of three-letter strings.
fn intern_office(id: &str) -> &'static str {
    match id {
        "OKX" => "OKX",
        "LOT" => "LOT",
        "MFL" => "MFL",
        "EWX" => "EWX",
        other => Box::leak(other.to_string().into_boxed_str()),
    }
}

impl GridCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve a city's grid point, fetching and caching on first use.
    pub async fn get_or_fetch(
        &self,
        city: City,
        lat: f64,
        lon: f64,
        user_agent: &str,
        limiter: &HostRateLimiter,
    ) -> Result<GridPoint, Error> {
        if let Some(gp) = self.inner.read().await.get(&city) {
            return Ok(*gp);
        }

        let url = format!("https://api.weather.gov/points/{lat},{lon}");
        let resp: PointsResponse =
            crate::fetch::fetch_json(&url, Some(user_agent), limiter, crate::fetch::DEFAULT_MAX_RETRIES)
                .await?;

        let gp = GridPoint {
            office: intern_office(&resp.properties.grid_id),
            grid_x: resp.properties.grid_x,
            grid_y: resp.properties.grid_y,
        };

        self.inner.write().await.insert(city, gp);
        Ok(gp)
    }
}

impl Default for GridCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_hit_after_first_fetch() {
        let cache = GridCache::new();
        cache
            .inner
            .write()
            .await
            .insert(City::Nyc, GridPoint { office: "OKX", grid_x: 33, grid_y: 37 });

        // A second get_or_fetch for the same city must never reach the
        // network: supply an invalid URL host that would fail DNS, and
        // confirm we still get the cached value back.
        let gp = cache
            .get_or_fetch(City::Nyc, 999.0, 999.0, "test-agent", &HostRateLimiter::new(1.0))
            .await
            .unwrap();
        assert_eq!(gp.grid_x, 33);
        assert_eq!(gp.grid_y, 37);
    }
}
