//! Unit conversions used when normalizing NWS gridpoint data.

/// Round to one decimal place — every conversion in this module rounds its
/// result the same way, which is why a Celsius→Fahrenheit→Celsius round
/// trip differs from the original by at most 0.1.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    round1(c * 9.0 / 5.0 + 32.0)
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    round1((f - 32.0) * 5.0 / 9.0)
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    round1(kmh * 0.621371)
}

pub fn pa_to_hpa(pa: f64) -> f64 {
    round1(pa / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_to_fahrenheit_matches_unit_correctness_invariant() {
        // forecast_high_f == round(celsius*9/5 + 32, 1)
        let c = 12.3;
        let expected = ((c * 9.0 / 5.0 + 32.0) * 10.0).round() / 10.0;
        assert_eq!(celsius_to_fahrenheit(c), expected);
    }

    #[test]
    fn celsius_to_fahrenheit_known_value() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
    }

    #[test]
    fn round_trip_within_one_tenth_degree() {
        for f in [32.0, 55.5, 98.6, -4.3] {
            let c = fahrenheit_to_celsius(f);
            let back = celsius_to_fahrenheit(c);
            assert!((back - f).abs() <= 0.1, "{f} round-tripped to {back}");
        }
    }

    #[test]
    fn kmh_to_mph_known_value() {
        assert!((kmh_to_mph(100.0) - 62.1).abs() < 0.01);
    }
}
