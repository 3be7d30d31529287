//! NWS period forecast, gridpoint raw, and CLI product fetchers.

use chrono::Utc;
use common::{City, Error, WeatherForecast, WeatherSource};
use regex::Regex;
use serde::Deserialize;

use crate::grid_cache::GridPoint;
use crate::rate_limit::HostRateLimiter;
use crate::units::{celsius_to_fahrenheit, kmh_to_mph, pa_to_hpa};

#[derive(Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Deserialize)]
struct ForecastProperties {
    periods: Vec<ForecastPeriod>,
}

#[derive(Deserialize)]
struct ForecastPeriod {
    #[serde(rename = "isDaytime")]
    is_daytime: bool,
    temperature: f64,
    #[serde(rename = "windSpeed")]
    wind_speed: Option<String>,
}

/// Parse strings like `"10 to 15 mph"` to the upper bound, or a bare
/// `"10 mph"` to that single value.
fn parse_wind_upper_mph(s: &str) -> Option<f64> {
    let re = Regex::new(r"(\d+)(?:\s*to\s*(\d+))?\s*mph").ok()?;
    let caps = re.captures(s)?;
    if let Some(hi) = caps.get(2) {
        hi.as_str().parse().ok()
    } else {
        caps.get(1)?.as_str().parse().ok()
    }
}

/// Fetch the NWS period forecast and extract the first daytime high.
/// Temperatures are already in °F.
pub async fn fetch_period_forecast(
    city: City,
    gp: GridPoint,
    user_agent: &str,
    limiter: &HostRateLimiter,
) -> Result<WeatherForecast, Error> {
    let url = format!(
        "https://api.weather.gov/gridpoints/{}/{},{}/forecast",
        gp.office, gp.grid_x, gp.grid_y
    );
    let raw = crate::fetch::fetch_text(&url, Some(user_agent), limiter, crate::fetch::DEFAULT_MAX_RETRIES).await?;
    let parsed: ForecastResponse = serde_json::from_str(&raw)?;

    let day_index = parsed
        .properties
        .periods
        .iter()
        .position(|p| p.is_daytime)
        .ok_or_else(|| Error::Parse("no daytime period in NWS forecast".into()))?;
    let day_period = &parsed.properties.periods[day_index];

    // The overnight low is the next period (the following night), if present.
    let low_f = parsed
        .properties
        .periods
        .get(day_index + 1)
        .filter(|p| !p.is_daytime)
        .map(|p| p.temperature);

    let wind_mph = day_period.wind_speed.as_deref().and_then(parse_wind_upper_mph);

    Ok(WeatherForecast {
        id: 0,
        city,
        target_date: common::local_standard_date(city, Utc::now()),
        source: WeatherSource::Nws,
        forecast_high_f: day_period.temperature,
        forecast_low_f: low_f,
        humidity_pct: None,
        wind_mph,
        cloud_cover_pct: None,
        raw_response: raw,
        fetched_at: Utc::now(),
    })
}

#[derive(Deserialize)]
struct GridpointRawResponse {
    properties: GridpointRawProperties,
}

#[derive(Deserialize)]
struct GridpointRawProperties {
    temperature: GridpointSeries,
    #[serde(rename = "minTemperature")]
    min_temperature: Option<GridpointSeries>,
    dewpoint: Option<GridpointSeries>,
    #[serde(rename = "windSpeed")]
    wind_speed: Option<GridpointSeries>,
    #[serde(rename = "relativeHumidity")]
    relative_humidity: Option<GridpointSeries>,
    #[serde(rename = "skyCover")]
    sky_cover: Option<GridpointSeries>,
    #[serde(rename = "barometricPressure")]
    barometric_pressure: Option<GridpointSeries>,
}

#[derive(Deserialize)]
struct GridpointSeries {
    values: Vec<GridpointValue>,
}

#[derive(Deserialize)]
struct GridpointValue {
    value: Option<f64>,
}

fn latest_value(series: &Option<GridpointSeries>) -> Option<f64> {
    series.as_ref()?.values.first()?.value
}

/// Fetch the raw gridpoint data. Temperature and dew point arrive in °C
/// (converted), wind speed in km/h (× 0.621371), pressure in Pa (÷ 100).
pub async fn fetch_gridpoint_raw(
    city: City,
    gp: GridPoint,
    user_agent: &str,
    limiter: &HostRateLimiter,
) -> Result<WeatherForecast, Error> {
    let url = format!(
        "https://api.weather.gov/gridpoints/{}/{},{}",
        gp.office, gp.grid_x, gp.grid_y
    );
    let raw = crate::fetch::fetch_text(&url, Some(user_agent), limiter, crate::fetch::DEFAULT_MAX_RETRIES).await?;
    let parsed: GridpointRawResponse = serde_json::from_str(&raw)?;

    let temp_c = parsed
        .properties
        .temperature
        .values
        .first()
        .and_then(|v| v.value)
        .ok_or_else(|| Error::Parse("no temperature value in gridpoint response".into()))?;

    let _ = parsed.properties.barometric_pressure.as_ref().and_then(latest_value).map(pa_to_hpa);

    Ok(WeatherForecast {
        id: 0,
        city,
        target_date: common::local_standard_date(city, Utc::now()),
        source: WeatherSource::NwsGridpoint,
        forecast_high_f: celsius_to_fahrenheit(temp_c),
        forecast_low_f: latest_value(&parsed.properties.min_temperature).map(celsius_to_fahrenheit),
        humidity_pct: latest_value(&parsed.properties.relative_humidity),
        wind_mph: latest_value(&parsed.properties.wind_speed).map(kmh_to_mph),
        cloud_cover_pct: latest_value(&parsed.properties.sky_cover),
        raw_response: raw,
        fetched_at: Utc::now(),
    })
}

/// Fetch the plain-text NWS Daily Climate Report (CLI) product for a
/// station.
pub async fn fetch_cli_text(
    office: &str,
    station: &str,
    user_agent: &str,
    limiter: &HostRateLimiter,
) -> Result<String, Error> {
    let url = format!(
        "https://forecast.weather.gov/product.php?site={office}&issuedby={station}&product=CLI&format=txt"
    );
    crate::fetch::fetch_text(&url, Some(user_agent), limiter, crate::fetch::DEFAULT_MAX_RETRIES).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_range_takes_upper_bound() {
        assert_eq!(parse_wind_upper_mph("10 to 15 mph"), Some(15.0));
    }

    #[test]
    fn wind_single_value() {
        assert_eq!(parse_wind_upper_mph("10 mph"), Some(10.0));
    }
}
