//! Deduplication for prediction: keep the most recent row per source
//!.

use common::WeatherForecast;
use std::collections::HashMap;

/// From a set of forecasts for one (city, date), keep only the
/// newest-`fetched_at` row per distinct source.
pub fn latest_per_source(forecasts: Vec<WeatherForecast>) -> Vec<WeatherForecast> {
    let mut latest: HashMap<common::WeatherSource, WeatherForecast> = HashMap::new();
    for fc in forecasts {
        latest
            .entry(fc.source)
            .and_modify(|existing| {
                if fc.fetched_at > existing.fetched_at {
                    *existing = fc.clone();
                }
            })
            .or_insert(fc);
    }
    latest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::{City, WeatherSource};

    fn fc(source: WeatherSource, high: f64, fetched_at: chrono::DateTime<Utc>) -> WeatherForecast {
        WeatherForecast {
            id: 0,
            city: City::Nyc,
            target_date: common::local_standard_date(City::Nyc, fetched_at),
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
    fn keeps_newest_per_source() {
        let old = fc(WeatherSource::Nws, 50.0, Utc.with_ymd_and_hms(2026, 2, 18, 6, 0, 0).unwrap());
        let newer = fc(WeatherSource::Nws, 55.0, Utc.with_ymd_and_hms(2026, 2, 18, 12, 0, 0).unwrap());
        let other = fc(WeatherSource::OpenMeteoGfs, 53.0, Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap());

        let result = latest_per_source(vec![old, newer.clone(), other.clone()]);
        assert_eq!(result.len(), 2);
        let nws_row = result.iter().find(|r| r.source == WeatherSource::Nws).unwrap();
        assert_eq!(nws_row.forecast_high_f, 55.0);
    }
}
