//! Aggregates a day's `WeatherForecast` rows for one city into the
//! ensemble's fixed-order feature inputs, deduplicating to the newest
//! reading per source.

use chrono::{Datelike, NaiveDate};
use common::{City, WeatherForecast, WeatherSource};
use prediction::feature::RawFeatureInputs;
use std::collections::HashMap;

pub fn dedup_latest_per_source(rows: Vec<WeatherForecast>) -> HashMap<WeatherSource, WeatherForecast> {
    let mut latest: HashMap<WeatherSource, WeatherForecast> = HashMap::new();
    for row in rows {
        match latest.get(&row.source) {
            Some(existing) if existing.fetched_at >= row.fetched_at => {}
            _ => {
                latest.insert(row.source, row);
            }
        }
    }
    latest
}

pub fn raw_inputs_from_forecasts(city: City, target_date: NaiveDate, rows: Vec<WeatherForecast>) -> Option<RawFeatureInputs> {
    let by_source = dedup_latest_per_source(rows);
    if by_source.is_empty() {
        return None;
    }

    let highs_by_source: HashMap<WeatherSource, f64> = by_source.iter().map(|(s, f)| (*s, f.forecast_high_f)).collect();
    let lows_by_source: HashMap<WeatherSource, f64> =
        by_source.iter().filter_map(|(s, f)| f.forecast_low_f.map(|lo| (*s, lo))).collect();

    let highs: Vec<f64> = highs_by_source.values().copied().collect();
    let source_spread_f = highs.iter().cloned().fold(f64::MIN, f64::max) - highs.iter().cloned().fold(f64::MAX, f64::min);

    let nws = by_source.get(&WeatherSource::Nws);

    Some(RawFeatureInputs {
        highs_by_source,
        lows_by_source,
        nws_humidity_pct: nws.and_then(|f| f.humidity_pct),
        nws_wind_mph: nws.and_then(|f| f.wind_mph),
        nws_cloud_cover_pct: nws.and_then(|f| f.cloud_cover_pct),
        source_spread_f: source_spread_f.max(0.0),
        source_count: highs.len() as f64,
        month: target_date.month(),
        day_of_year: target_date.ordinal(),
        city,
    })
}

/// The ensemble's fallback point estimate and dispersion when no model
/// weights an average: the mean and sample std of the per-source highs.
pub fn mean_and_std(highs_by_source: &HashMap<WeatherSource, f64>) -> (f64, f64) {
    let values: Vec<f64> = highs_by_source.values().copied().collect();
    if values.is_empty() {
        return (f64::NAN, 1.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if values.len() == 1 {
        return (mean, 1.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    (mean, variance.sqrt().max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn forecast(source: WeatherSource, high: f64, fetched_at: chrono::DateTime<Utc>) -> WeatherForecast {
        WeatherForecast {
            id: 0,
            city: City::Nyc,
            target_date: NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(),
            source,
            forecast_high_f: high,
            forecast_low_f: None,
            humidity_pct: None,
            wind_mph: None,
            cloud_cover_pct: None,
            raw_response: String::new(),
            fetched_at,
        }
    }

    #[test]
    fn keeps_the_newest_row_per_source() {
        let now = Utc::now();
        let rows = vec![
            forecast(WeatherSource::Nws, 50.0, now - chrono::Duration::hours(2)),
            forecast(WeatherSource::Nws, 55.0, now),
        ];
        let deduped = dedup_latest_per_source(rows);
        assert_eq!(deduped.get(&WeatherSource::Nws).unwrap().forecast_high_f, 55.0);
    }

    #[test]
    fn empty_rows_yield_no_inputs() {
        assert!(raw_inputs_from_forecasts(City::Nyc, NaiveDate::from_ymd_opt(2026, 2, 18).unwrap(), vec![]).is_none());
    }

    #[test]
    fn mean_and_std_of_a_single_source_floors_std_at_one() {
        let mut highs = HashMap::new();
        highs.insert(WeatherSource::Nws, 55.0);
        let (mean, std) = mean_and_std(&highs);
        assert_eq!(mean, 55.0);
        assert_eq!(std, 1.0);
    }
}
