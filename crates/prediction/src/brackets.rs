//! Bracket-probability integration: given a predicted high (the mean) and
//! an ensemble-implied spread (the std dev), compute `P(high falls in
//! bracket)` for each market bracket via a true normal CDF.
//!
//! Open-ended brackets (`lower_f: None` or `upper_f: None`) integrate out
//! to +/-infinity, and probabilities are renormalized so the full set sums
//! to exactly 1.0, never an approximation.

use common::BracketProbability;
use statrs::distribution::{ContinuousCDF, Normal};

/// Standard deviations below this are clamped up: a near-zero
/// ensemble spread would otherwise produce near-degenerate (0 or 1)
/// bracket probabilities that overstate model confidence.
const MIN_STD_F: f64 = 1.0;

/// One bracket as published by a market: half-open or fully-open ranges
/// are represented with `None` on the unbounded side.
pub struct MarketBracket {
    pub label: String,
    pub lower_f: Option<f64>,
    pub upper_f: Option<f64>,
}

pub fn compute_bracket_probabilities(
    mean_f: f64,
    std_f: f64,
    brackets: &[MarketBracket],
) -> Vec<BracketProbability> {
    let std = std_f.max(MIN_STD_F);
    let normal = Normal::new(mean_f, std).expect("valid normal parameters");

    let raw: Vec<f64> = brackets
        .iter()
        .map(|b| {
            let upper_cdf = b.upper_f.map(|u| normal.cdf(u)).unwrap_or(1.0);
            let lower_cdf = b.lower_f.map(|l| normal.cdf(l)).unwrap_or(0.0);
            (upper_cdf - lower_cdf).max(0.0)
        })
        .collect();

    let total: f64 = raw.iter().sum();
    let total = if total > 0.0 { total } else { 1.0 };

    brackets
        .iter()
        .zip(raw.iter())
        .map(|(b, &p)| BracketProbability {
            label: b.label.clone(),
            lower_f: b.lower_f,
            upper_f: b.upper_f,
            probability: p / total,
        })
        .collect()
}

/// Six contiguous 2-degree brackets centered loosely around a typical
/// seasonal range, used when the market gateway cannot supply the real
/// bracket definitions for a city/date.
pub fn synthetic_brackets(center_f: f64) -> Vec<MarketBracket> {
    let start = (center_f / 2.0).floor() * 2.0 - 4.0;
    let mut brackets = Vec::with_capacity(6);
    for i in 0..6 {
        let lower = start + (i as f64) * 2.0;
        let upper = lower + 2.0;
        let (lower_f, upper_f, label) = if i == 0 {
            (None, Some(upper), format!("below {upper:.0}"))
        } else if i == 5 {
            (Some(lower), None, format!("{lower:.0} or above"))
        } else {
            (Some(lower), Some(upper), format!("{lower:.0}-{upper:.0}"))
        };
        brackets.push(MarketBracket { label, lower_f, upper_f });
    }
    brackets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_brackets() -> Vec<MarketBracket> {
        vec![
            MarketBracket { label: "below 50".into(), lower_f: None, upper_f: Some(50.0) },
            MarketBracket { label: "50-54".into(), lower_f: Some(50.0), upper_f: Some(54.0) },
            MarketBracket { label: "54-58".into(), lower_f: Some(54.0), upper_f: Some(58.0) },
            MarketBracket { label: "58 or above".into(), lower_f: Some(58.0), upper_f: None },
        ]
    }

    #[test]
    fn probabilities_sum_to_one() {
        let result = compute_bracket_probabilities(55.0, 2.0, &sample_brackets());
        let total: f64 = result.iter().map(|b| b.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mean_at_bracket_center_has_highest_probability_there() {
        let result = compute_bracket_probabilities(56.0, 2.0, &sample_brackets());
        let middle = result.iter().find(|b| b.label == "54-58").unwrap().probability;
        let tail = result.iter().find(|b| b.label == "below 50").unwrap().probability;
        assert!(middle > tail);
    }

    #[test]
    fn near_zero_std_is_floored_not_degenerate() {
        let result = compute_bracket_probabilities(55.0, 0.0001, &sample_brackets());
        for b in &result {
            assert!(b.probability.is_finite());
        }
        let total: f64 = result.iter().map(|b| b.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn synthetic_brackets_has_six_contiguous_ranges() {
        let brackets = synthetic_brackets(55.0);
        assert_eq!(brackets.len(), 6);
        assert!(brackets[0].lower_f.is_none());
        assert!(brackets[5].upper_f.is_none());
    }
}
