//! Event-ticker construction and bracket-label derivation.

use chrono::{Datelike, NaiveDate};
use common::City;
use prediction::brackets::MarketBracket;

const MONTH_ABBR: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// `KXHIGHNY-26FEB18` for NYC on 2026-02-18.
pub fn build_event_ticker(city: City, date: NaiveDate) -> String {
    let yy = date.year() % 100;
    let mon = MONTH_ABBR[(date.month() as usize) - 1];
    format!("{}-{:02}{}{:02}", city.series(), yy, mon, date.day())
}

/// Derives a bracket range from a market's published floor/cap strikes.
/// `None` on either side means the bracket is open-ended in that
/// direction (the lowest/highest bracket in an event).
pub fn bracket_from_strikes(
    ticker: &str,
    floor_strike: Option<f64>,
    cap_strike: Option<f64>,
) -> MarketBracket {
    let label = match (floor_strike, cap_strike) {
        (None, Some(cap)) => format!("below {cap:.0}"),
        (Some(floor), None) => format!("{floor:.0} or above"),
        (Some(floor), Some(cap)) => format!("{floor:.0}-{cap:.0}"),
        (None, None) => ticker.to_string(),
    };
    MarketBracket {
        label,
        lower_f: floor_strike,
        upper_f: cap_strike,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_canonical_nyc_ticker() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        assert_eq!(build_event_ticker(City::Nyc, date), "KXHIGHNY-26FEB18");
    }

    #[test]
    fn builds_tickers_for_all_cities() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 4).unwrap();
        assert_eq!(build_event_ticker(City::Chi, date), "KXHIGHCHI-26JUL04");
        assert_eq!(build_event_ticker(City::Mia, date), "KXHIGHMIA-26JUL04");
        assert_eq!(build_event_ticker(City::Aus, date), "KXHIGHAUS-26JUL04");
    }

    #[test]
    fn open_ended_low_bracket_has_no_lower_bound() {
        let bracket = bracket_from_strikes("T-BELOW", None, Some(50.0));
        assert_eq!(bracket.lower_f, None);
        assert_eq!(bracket.label, "below 50");
    }

    #[test]
    fn middle_bracket_has_both_bounds() {
        let bracket = bracket_from_strikes("T-MID", Some(54.0), Some(58.0));
        assert_eq!(bracket.label, "54-58");
    }
}
