//! Open-Meteo multi-model forecast client.
//!
//! Requests GFS, ECMWF, and ICON in one call. Per-model daily blocks may
//! appear either nested under the model name or as suffix-keyed columns in
//! a shared `daily` block; the extractor tries the nested form first, then
//! strips suffixes to remap to standard variable names.

use chrono::Utc;
use common::{City, Error, WeatherForecast, WeatherSource};
use serde_json::Value;

use crate::rate_limit::HostRateLimiter;

const MODELS: &str = "gfs_seamless,ecmwf_ifs025,icon_seamless";

async fn fetch_raw(lat: f64, lon: f64, limiter: &HostRateLimiter) -> Result<Value, Error> {
    let url = format!(
        "https://api.open-meteo.com/v1/forecast?latitude={lat}&longitude={lon}\
         &daily=temperature_2m_max,temperature_2m_min\
         &models={MODELS}&temperature_unit=fahrenheit&windspeed_unit=mph\
         &timezone=auto&forecast_days=7"
    );
    crate::fetch::fetch_json(&url, None, limiter, crate::fetch::DEFAULT_MAX_RETRIES).await
}

/// Model identifiers as they appear suffixed onto Open-Meteo variable
/// names, paired with the `WeatherSource` they normalize to.
const MODEL_SUFFIXES: &[(&str, WeatherSource)] = &[
    ("gfs_seamless", WeatherSource::OpenMeteoGfs),
    ("ecmwf_ifs025", WeatherSource::OpenMeteoEcmwf),
    ("icon_seamless", WeatherSource::OpenMeteoIcon),
];

/// Extract today's max temperature for a given model from the response,
/// trying the nested-by-model shape first, then the suffix-keyed shared
/// `daily` block.
fn extract_high_f(body: &Value, model_key: &str) -> Option<f64> {
    extract_daily_f(body, model_key, "temperature_2m_max")
}

/// Same lookup as `extract_high_f`, for the day's low instead.
fn extract_low_f(body: &Value, model_key: &str) -> Option<f64> {
    extract_daily_f(body, model_key, "temperature_2m_min")
}

fn extract_daily_f(body: &Value, model_key: &str, variable: &str) -> Option<f64> {
    // Nested form: { "<model_key>": { "daily": { "<variable>": [..] } } }
    if let Some(v) = body
        .get(model_key)
        .and_then(|m| m.get("daily"))
        .and_then(|d| d.get(variable))
        .and_then(|arr| arr.get(0))
        .and_then(Value::as_f64)
    {
        return Some(v);
    }

    // Suffix-keyed form: { "daily": { "<variable>_<model_key>": [..] } }
    let suffixed_key = format!("{variable}_{model_key}");
    body.get("daily")
        .and_then(|d| d.get(&suffixed_key))
        .and_then(|arr| arr.get(0))
        .and_then(Value::as_f64)
}

/// Normalize one Open-Meteo response into up to three `WeatherForecast`
/// rows, one per contributing model.
pub fn normalize_openmeteo(city: City, body: &Value, raw_text: &str) -> Vec<WeatherForecast> {
    let mut out = Vec::new();
    for (model_key, source) in MODEL_SUFFIXES {
        if let Some(high_f) = extract_high_f(body, model_key) {
            out.push(WeatherForecast {
                id: 0,
                city,
                target_date: common::local_standard_date(city, Utc::now()),
                source: *source,
                forecast_high_f: high_f,
                forecast_low_f: extract_low_f(body, model_key),
                humidity_pct: None,
                wind_mph: None,
                cloud_cover_pct: None,
                raw_response: raw_text.to_string(),
                fetched_at: Utc::now(),
            });
        }
    }
    out
}

/// Fetch and normalize the multi-model forecast for one city.
pub async fn fetch_multi_model(
    city: City,
    lat: f64,
    lon: f64,
    limiter: &HostRateLimiter,
) -> Result<Vec<WeatherForecast>, Error> {
    let body = fetch_raw(lat, lon, limiter).await?;
    let raw_text = body.to_string();
    Ok(normalize_openmeteo(city, &body, &raw_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_nested_shape() {
        let body = json!({
            "gfs_seamless": { "daily": { "temperature_2m_max": [72.5] } }
        });
        assert_eq!(extract_high_f(&body, "gfs_seamless"), Some(72.5));
    }

    #[test]
    fn extracts_suffix_keyed_shape() {
        let body = json!({
            "daily": { "temperature_2m_max_ecmwf_ifs025": [68.1] }
        });
        assert_eq!(extract_high_f(&body, "ecmwf_ifs025"), Some(68.1));
    }

    #[test]
    fn nested_and_suffixed_produce_same_row_count() {
        let nested = json!({
            "gfs_seamless": { "daily": { "temperature_2m_max": [70.0] } },
            "ecmwf_ifs025": { "daily": { "temperature_2m_max": [71.0] } },
            "icon_seamless": { "daily": { "temperature_2m_max": [69.0] } },
        });
        let suffixed = json!({
            "daily": {
                "temperature_2m_max_gfs_seamless": [70.0],
                "temperature_2m_max_ecmwf_ifs025": [71.0],
                "temperature_2m_max_icon_seamless": [69.0],
            }
        });
        let a = normalize_openmeteo(common::City::Nyc, &nested, "{}");
        let b = normalize_openmeteo(common::City::Nyc, &suffixed, "{}");
        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn missing_model_is_skipped_not_failed() {
        let body = json!({
            "gfs_seamless": { "daily": { "temperature_2m_max": [70.0] } }
        });
        let rows = normalize_openmeteo(common::City::Chi, &body, "{}");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn extracts_low_alongside_high() {
        let body = json!({
            "gfs_seamless": { "daily": { "temperature_2m_max": [70.0], "temperature_2m_min": [52.0] } }
        });
        let rows = normalize_openmeteo(common::City::Nyc, &body, "{}");
        assert_eq!(rows[0].forecast_low_f, Some(52.0));
    }
}
