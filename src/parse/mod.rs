pub mod alarm;
pub mod date;
pub mod hide;
pub mod repeat;

pub use alarm::{AlarmPattern, AlarmUnit};
pub use date::parse_datetime;
pub use hide::{HideAnchor, HidePattern, HideUnit};
pub use repeat::{FixedInterval, Ordinal, PeriodUnit, RepeatPattern};

use chrono::Weekday;

/// Error type for repeat, hide and alarm pattern strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unrecognized pattern: {0:?}")]
    Unknown(String),
    #[error("malformed number {number:?} in pattern {pattern:?}")]
    BadNumber { pattern: String, number: String },
    #[error("{number} is out of range in pattern {pattern:?} (expected {expected})")]
    OutOfRange {
        pattern: String,
        number: String,
        expected: &'static str,
    },
}

impl PatternError {
    fn bad_number(pattern: &str, number: &str) -> Self {
        PatternError::BadNumber {
            pattern: pattern.to_string(),
            number: number.to_string(),
        }
    }

    fn out_of_range(pattern: &str, number: &str, expected: &'static str) -> Self {
        PatternError::OutOfRange {
            pattern: pattern.to_string(),
            number: number.to_string(),
            expected,
        }
    }
}

/// Lowercase and collapse runs of whitespace, so `"Last  day of\tevery month"`
/// compares equal to the canonical spelling.
pub(crate) fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Three-letter day name used in patterns (`Mon` … `Sun`)
pub fn day3(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Parse a three-letter day name, case-insensitively.
pub fn parse_day3(s: &str) -> Option<Weekday> {
    match s.trim().to_ascii_lowercase().as_str() {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// `"1 Day"`, `"2 Days"`: singular only for exactly one.
pub(crate) fn pluralize(num: impl Into<f64>, singular: &str) -> String {
    if num.into() == 1.0 {
        singular.to_string()
    } else {
        format!("{}s", singular)
    }
}
