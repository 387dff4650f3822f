//! Display formatting for ratio values.
//!
//! Formatting never touches the stored value: every function takes the
//! number by value and returns text.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::RatioValue;

const PERCENT_TERMS: [&str; 3] = ["Margin", "Ratio", "Holdings"];
const WHOLE_NUMBER_TERMS: [&str; 2] = ["Days", "Working Capital"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    /// `12.3%`
    Percentage,
    /// `1,234`
    Thousands,
    /// `1.23`
    Fixed,
}

impl DisplayFormat {
    /// Choose a format from the ratio name.
    pub fn for_ratio(ratio_name: &str) -> Self {
        if PERCENT_TERMS.iter().any(|t| ratio_name.contains(t)) {
            DisplayFormat::Percentage
        } else if WHOLE_NUMBER_TERMS.iter().any(|t| ratio_name.contains(t)) {
            DisplayFormat::Thousands
        } else {
            DisplayFormat::Fixed
        }
    }

    pub fn apply(self, value: RatioValue) -> String {
        match self {
            DisplayFormat::Percentage => format_percent(value),
            DisplayFormat::Thousands => format_thousands(value),
            DisplayFormat::Fixed => format_fixed(value),
        }
    }
}

/// Format a value the way the display table shows it for `ratio_name`.
pub fn format_value(ratio_name: &str, value: RatioValue) -> String {
    DisplayFormat::for_ratio(ratio_name).apply(value)
}

/// Absent values render as an empty cell.
pub fn format_optional(ratio_name: &str, value: Option<RatioValue>) -> String {
    value.map(|v| format_value(ratio_name, v)).unwrap_or_default()
}

/// Fraction as a percentage with one decimal: `0.1234` -> `12.3%`.
///
/// The decimal point is shifted in the text rather than multiplying by 100,
/// so values near the top of the decimal range still format.
pub fn format_percent(value: RatioValue) -> String {
    let text = format!("{:.3}", value.round_dp(3));
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, "000"));
    let whole = format!("{int}{}", &frac[..2]);
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    format!("{sign}{whole}.{}%", &frac[2..])
}

/// Two-decimal fixed notation: `1.1` -> `1.10`.
pub fn format_fixed(value: RatioValue) -> String {
    format!("{:.2}", value.round_dp(2))
}

/// Whole number with thousands separators: `12345.6` -> `12,346`.
pub fn format_thousands(value: RatioValue) -> String {
    let rounded = format!("{:.0}", value.round_dp(0));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

/// Signed two-decimal delta: `0.2` -> `+0.20`.
pub fn format_signed_fixed(value: RatioValue) -> String {
    let sign = if value.is_sign_negative() { "" } else { "+" };
    format!("{sign}{}", format_fixed(value))
}

/// Signed percentage delta: `0.012` -> `+1.2%`.
pub fn format_signed_percent(value: RatioValue) -> String {
    let sign = if value.is_sign_negative() { "" } else { "+" };
    format!("{sign}{}", format_percent(value))
}

/// Signed delta in the display format of `ratio_name`: percentages for
/// margins and ratios, whole numbers for day counts, two decimals otherwise.
pub fn format_signed_value(ratio_name: &str, delta: RatioValue) -> String {
    let sign = if delta.is_sign_negative() { "" } else { "+" };
    format!("{sign}{}", format_value(ratio_name, delta))
}

/// Read back any text produced by the formatters above. Percentages return
/// the fraction, so `parse_formatted("12.3%")` is `0.123`.
pub fn parse_formatted(text: &str) -> Option<RatioValue> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.strip_suffix('%') {
        Some(pct) => Decimal::from_str(pct.trim()).ok().map(|v| v / dec!(100)),
        None => Decimal::from_str(&cleaned).ok(),
    }
}
