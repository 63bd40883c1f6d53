use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;

use super::{PatternError, normalize, pluralize};

static BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) (minutes?|hours?|days?)$").expect("valid regex")
});

/// Longest accepted alarm offset, in seconds (100 years of 365 days).
const MAX_OFFSET_SECONDS: f64 = 100.0 * 365.0 * 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmUnit {
    Minute,
    Hour,
    Day,
}

impl AlarmUnit {
    pub fn name(self) -> &'static str {
        match self {
            AlarmUnit::Minute => "minute",
            AlarmUnit::Hour => "hour",
            AlarmUnit::Day => "day",
        }
    }

    pub fn from_label(s: &str) -> Option<AlarmUnit> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_suffix('s').unwrap_or(&lower) {
            "minute" => Some(AlarmUnit::Minute),
            "hour" => Some(AlarmUnit::Hour),
            "day" => Some(AlarmUnit::Day),
            _ => None,
        }
    }

    fn seconds(self) -> f64 {
        match self {
            AlarmUnit::Minute => 60.0,
            AlarmUnit::Hour => 3_600.0,
            AlarmUnit::Day => 86_400.0,
        }
    }
}

/// A parsed alarm (or snooze) pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlarmPattern {
    /// `due`: alarm fires at the due date
    Due,
    /// `1.5 hours`: alarm fires that long before the due date
    Before { amount: f64, unit: AlarmUnit },
}

impl AlarmPattern {
    pub fn parse(s: &str) -> Result<AlarmPattern, PatternError> {
        let norm = normalize(s);
        if norm == "due" {
            return Ok(AlarmPattern::Due);
        }

        let caps = BEFORE_RE
            .captures(&norm)
            .ok_or_else(|| PatternError::Unknown(s.to_string()))?;
        let raw = &caps[1];
        let amount: f64 = raw
            .parse()
            .map_err(|_| PatternError::bad_number(s, raw))?;
        if !amount.is_finite() {
            return Err(PatternError::bad_number(s, raw));
        }
        if amount < 0.0 {
            return Err(PatternError::out_of_range(s, raw, "zero or more"));
        }
        let unit =
            AlarmUnit::from_label(&caps[2]).ok_or_else(|| PatternError::Unknown(s.to_string()))?;
        if amount * unit.seconds() > MAX_OFFSET_SECONDS {
            return Err(PatternError::out_of_range(s, raw, "at most 100 years"));
        }
        Ok(AlarmPattern::Before { amount, unit })
    }

    /// `"<amount> <unit(s)>"`
    pub fn before(amount: f64, unit: AlarmUnit) -> AlarmPattern {
        AlarmPattern::Before { amount, unit }
    }

    /// How long before the due date the alarm fires.
    pub fn offset(&self) -> Duration {
        match self {
            AlarmPattern::Due => Duration::zero(),
            AlarmPattern::Before { amount, unit } => {
                Duration::milliseconds((amount * unit.seconds() * 1_000.0).round() as i64)
            }
        }
    }
}

impl fmt::Display for AlarmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmPattern::Due => f.write_str("due"),
            AlarmPattern::Before { amount, unit } => {
                write!(f, "{} {}", amount, pluralize(*amount, unit.name()))
            }
        }
    }
}

impl FromStr for AlarmPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlarmPattern::parse(s)
    }
}
