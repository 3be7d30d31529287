//! 21-float fixed-order feature vector.

use common::{City, WeatherSource};
use std::collections::HashMap;

pub const FEATURE_DIM: usize = 21;

/// Per-source forecast highs/lows plus NWS-only supplementary variables,
/// keyed the same way the ingestion layer produces them.
pub struct RawFeatureInputs {
    pub highs_by_source: HashMap<WeatherSource, f64>,
    pub lows_by_source: HashMap<WeatherSource, f64>,
    pub nws_humidity_pct: Option<f64>,
    pub nws_wind_mph: Option<f64>,
    pub nws_cloud_cover_pct: Option<f64>,
    pub source_spread_f: f64,
    pub source_count: f64,
    pub month: u32,
    pub day_of_year: u32,
    pub city: City,
}

const HIGH_LOW_SOURCES: [WeatherSource; 4] = [
    WeatherSource::Nws,
    WeatherSource::OpenMeteoEcmwf,
    WeatherSource::OpenMeteoGfs,
    WeatherSource::OpenMeteoIcon,
];

/// Build the fixed-order 21-float feature vector. Missing per-source
/// values are `NaN` — regressors that cannot handle NaN natively
/// must median-impute before predicting.
pub fn build_feature_vector(inputs: &RawFeatureInputs) -> [f64; FEATURE_DIM] {
    let mut v = [f64::NAN; FEATURE_DIM];
    let mut i = 0;

    for src in HIGH_LOW_SOURCES {
        v[i] = *inputs.highs_by_source.get(&src).unwrap_or(&f64::NAN);
        i += 1;
    }
    for src in HIGH_LOW_SOURCES {
        v[i] = *inputs.lows_by_source.get(&src).unwrap_or(&f64::NAN);
        i += 1;
    }

    v[i] = inputs.nws_humidity_pct.unwrap_or(f64::NAN);
    i += 1;
    v[i] = inputs.nws_wind_mph.unwrap_or(f64::NAN);
    i += 1;
    v[i] = inputs.nws_cloud_cover_pct.unwrap_or(f64::NAN);
    i += 1;

    v[i] = inputs.source_spread_f;
    i += 1;
    v[i] = inputs.source_count;
    i += 1;

    let month = inputs.month as f64;
    let doy = inputs.day_of_year as f64;
    v[i] = month;
    i += 1;
    v[i] = doy;
    i += 1;
    v[i] = (2.0 * std::f64::consts::PI * month / 12.0).sin();
    i += 1;
    v[i] = (2.0 * std::f64::consts::PI * month / 12.0).cos();
    i += 1;

    for city in City::ALL {
        v[i] = if city == inputs.city { 1.0 } else { 0.0 };
        i += 1;
    }

    debug_assert_eq!(i, FEATURE_DIM);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_inputs() -> RawFeatureInputs {
        let mut highs = HashMap::new();
        highs.insert(WeatherSource::Nws, 55.0);
        highs.insert(WeatherSource::OpenMeteoGfs, 54.0);
        RawFeatureInputs {
            highs_by_source: highs,
            lows_by_source: HashMap::new(),
            nws_humidity_pct: Some(60.0),
            nws_wind_mph: Some(8.0),
            nws_cloud_cover_pct: None,
            source_spread_f: 1.5,
            source_count: 2.0,
            month: 2,
            day_of_year: 49,
            city: City::Nyc,
        }
    }

    #[test]
    fn vector_has_21_components() {
        let v = build_feature_vector(&sample_inputs());
        assert_eq!(v.len(), FEATURE_DIM);
    }

    #[test]
    fn missing_sources_are_nan() {
        let v = build_feature_vector(&sample_inputs());
        // ECMWF high is the second slot (index 1) and wasn't provided.
        assert!(v[1].is_nan());
    }

    #[test]
    fn one_hot_city_indicator_is_correct() {
        let v = build_feature_vector(&sample_inputs());
        // City one-hot occupies the last 4 slots in City::ALL order.
        let city_slots = &v[17..21];
        assert_eq!(city_slots, &[1.0, 0.0, 0.0, 0.0]); // Nyc is City::ALL[0]
    }
}
