//! NWS CLI (Daily Climate Report) text parser — pure, no I/O.
//!
//! Parses the plain-text CLI product published by NWS weather forecast
//! offices. The CLI contains the official observed high/low temperatures
//! used for settlement. Grounded token-for-token in the reference
//! implementation's `backend/weather/cli_parser.py`.
//!
//! ```text
//! TEMPERATURE (F)
//!                        YESTERDAY     RECORD
//!   MAXIMUM                 54          72 (1999)
//!   MINIMUM                 38          11 (1967)
//! ```
//!
//! "MAXIMUM" under "YESTERDAY" is the settlement temperature — the second
//! column (the historical record) must never be picked up.

use chrono::NaiveDate;
use common::Error;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct CliReport {
    pub high_f: f64,
    pub low_f: Option<f64>,
    pub station: String,
    pub report_date: NaiveDate,
    pub raw_text: String,
}

pub fn parse_cli_text(text: &str) -> Result<CliReport, Error> {
    if text.trim().is_empty() {
        return Err(Error::Parse("empty CLI report text".into()));
    }

    let station = extract_station(text)?;
    let report_date = extract_report_date(text)?;
    let high_f = extract_temperature(text, "MAXIMUM", true)?
        .expect("required field always returns Some when Ok");
    let low_f = extract_temperature(text, "MINIMUM", false)?;

    Ok(CliReport {
        high_f,
        low_f,
        station,
        report_date,
        raw_text: text.to_string(),
    })
}

fn extract_station(text: &str) -> Result<String, Error> {
    if let Some(caps) = Regex::new(r"\(([A-Z]{4})\)").unwrap().captures(text) {
        return Ok(caps[1].to_string());
    }
    if let Some(caps) = Regex::new(r"CLI([A-Z]{3,4})\b").unwrap().captures(text) {
        return Ok(format!("K{}", &caps[1]));
    }
    if let Some(caps) = Regex::new(r"(?i)CLIMATE REPORT FOR\s+[^(]+\((\w+)\)")
        .unwrap()
        .captures(text)
    {
        return Ok(caps[1].to_string());
    }
    Err(Error::Parse("could not extract station identifier from CLI report header".into()))
}

const MONTH_NAMES: &[(&str, u32)] = &[
    ("JANUARY", 1),
    ("FEBRUARY", 2),
    ("MARCH", 3),
    ("APRIL", 4),
    ("MAY", 5),
    ("JUNE", 6),
    ("JULY", 7),
    ("AUGUST", 8),
    ("SEPTEMBER", 9),
    ("OCTOBER", 10),
    ("NOVEMBER", 11),
    ("DECEMBER", 12),
];

fn extract_report_date(text: &str) -> Result<NaiveDate, Error> {
    if let Some(caps) = Regex::new(r"(\d{2})/(\d{2})/(\d{4})").unwrap().captures(text) {
        let month: u32 = caps[1].parse().unwrap();
        let day: u32 = caps[2].parse().unwrap();
        let year: i32 = caps[3].parse().unwrap();
        return NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::Parse(format!("invalid date in CLI report: {}", &caps[0])));
    }

    let month_pattern = MONTH_NAMES.iter().map(|(n, _)| *n).collect::<Vec<_>>().join("|");
    let re = Regex::new(&format!(r"(?i)({month_pattern})\s+(\d{{1,2}})\s+(\d{{4}})")).unwrap();
    if let Some(caps) = re.captures(text) {
        let month_str = caps[1].to_uppercase();
        let day: u32 = caps[2].parse().unwrap();
        let year: i32 = caps[3].parse().unwrap();
        let month = MONTH_NAMES
            .iter()
            .find(|(n, _)| *n == month_str)
            .map(|(_, m)| *m)
            .ok_or_else(|| Error::Parse("unknown month name in CLI report".into()))?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::Parse(format!("invalid date in CLI report: {}", &caps[0])));
    }

    Err(Error::Parse("could not extract report date from CLI report".into()))
}

/// `required`: true for MAXIMUM (must be present and not `M`), false for
/// MINIMUM (missing section/field/`M` all yield `None`).
fn extract_temperature(text: &str, field: &str, required: bool) -> Result<Option<f64>, Error> {
    let section_re = Regex::new(
        r"(?is)TEMPERATURE\s*\(?F?\)?.*?\n(.*?)(?:\n\s*\n|\nPRECIPITATION|\nHEATING|\nCOOLING|\z)",
    )
    .unwrap();

    let temp_section = match section_re.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => {
            if required {
                return Err(Error::Parse(format!(
                    "no TEMPERATURE section found in CLI report for {field}"
                )));
            }
            return Ok(None);
        }
    };

    let field_re = Regex::new(&format!(r"(?i){field}\s+([-\dM]+)")).unwrap();
    let value_str = match field_re.captures(&temp_section) {
        Some(caps) => caps[1].trim().to_string(),
        None => {
            if required {
                return Err(Error::Parse(format!("no {field} value found in TEMPERATURE section")));
            }
            return Ok(None);
        }
    };

    if value_str.eq_ignore_ascii_case("M") {
        if required {
            return Err(Error::Parse(format!("{field} temperature is missing (M) in CLI report")));
        }
        return Ok(None);
    }

    value_str
        .parse::<f64>()
        .map(Some)
        .map_err(|_| Error::Parse(format!("could not parse {field} temperature value: {value_str:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
CLIMATE REPORT FOR NEW YORK CENTRAL PARK (KNYC)
NATIONAL WEATHER SERVICE
FOR YESTERDAY  02/18/2026

...

TEMPERATURE (F)
                       YESTERDAY     RECORD
  MAXIMUM                 54          72 (1999)
  MINIMUM                 38          11 (1967)

PRECIPITATION (IN)
";

    #[test]
    fn canonical_sample_high_is_54() {
        // Must read the YESTERDAY column, not the RECORD column.
        let report = parse_cli_text(SAMPLE).unwrap();
        assert_eq!(report.high_f, 54.0);
        assert_eq!(report.low_f, Some(38.0));
        assert_eq!(report.station, "KNYC");
        assert_eq!(report.report_date, NaiveDate::from_ymd_opt(2026, 2, 18).unwrap());
    }

    #[test]
    fn required_missing_maximum_fails() {
        let text = SAMPLE.replace("MAXIMUM                 54", "MAXIMUM                 M");
        assert!(parse_cli_text(&text).is_err());
    }

    #[test]
    fn optional_missing_minimum_is_null_high_still_valid() {
        let text = SAMPLE.replace("MINIMUM                 38", "MINIMUM                 M");
        let report = parse_cli_text(&text).unwrap();
        assert_eq!(report.low_f, None);
        assert_eq!(report.high_f, 54.0);
    }

    #[test]
    fn empty_text_fails() {
        assert!(parse_cli_text("").is_err());
        assert!(parse_cli_text("   \n  ").is_err());
    }

    #[test]
    fn station_from_cli_product_prefix() {
        let text = "CLIORD   CLIMATE REPORT FOR CHICAGO MIDWAY\n\
                     FOR YESTERDAY 03/01/2026\n\
                     TEMPERATURE (F)\n  MAXIMUM 40 60 (1980)\n";
        let report = parse_cli_text(text).unwrap();
        assert_eq!(report.station, "KORD");
    }

    #[test]
    fn negative_temperature_parses() {
        let text = "CLIMATE REPORT FOR FAIRBANKS (PAFA)\n\
                     02/10/2026\n\
                     TEMPERATURE (F)\n  MAXIMUM -5 20 (1950)\n";
        let report = parse_cli_text(text).unwrap();
        assert_eq!(report.high_f, -5.0);
    }
}
