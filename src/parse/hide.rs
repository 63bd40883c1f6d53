use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::{PatternError, normalize, pluralize};

/// Largest count accepted in `"<N> <unit> before <anchor>"`.
pub const HIDE_MAX: u32 = 99;

static BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+) (days?|weeks?|months?) before (due|start)$").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideUnit {
    Day,
    Week,
    Month,
}

impl HideUnit {
    pub fn name(self) -> &'static str {
        match self {
            HideUnit::Day => "day",
            HideUnit::Week => "week",
            HideUnit::Month => "month",
        }
    }

    pub fn from_label(s: &str) -> Option<HideUnit> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_suffix('s').unwrap_or(&lower) {
            "day" => Some(HideUnit::Day),
            "week" => Some(HideUnit::Week),
            "month" => Some(HideUnit::Month),
            _ => None,
        }
    }
}

/// The date a relative hide pattern counts back from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideAnchor {
    Due,
    Start,
}

impl HideAnchor {
    pub fn name(self) -> &'static str {
        match self {
            HideAnchor::Due => "due",
            HideAnchor::Start => "start",
        }
    }

    pub fn from_label(s: &str) -> Option<HideAnchor> {
        match s.trim().to_ascii_lowercase().as_str() {
            "due" => Some(HideAnchor::Due),
            "start" => Some(HideAnchor::Start),
            _ => None,
        }
    }
}

/// A parsed hide pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidePattern {
    /// `task is due`: hidden until the due (or start) date
    TaskIsDue,
    /// `given date`: `hide_until` was entered by hand and is kept as is
    GivenDate,
    /// `2 weeks before due`
    Before {
        num: u32,
        unit: HideUnit,
        anchor: HideAnchor,
    },
}

impl HidePattern {
    pub fn parse(s: &str) -> Result<HidePattern, PatternError> {
        let norm = normalize(s);
        match norm.as_str() {
            "task is due" => return Ok(HidePattern::TaskIsDue),
            "given date" => return Ok(HidePattern::GivenDate),
            _ => {}
        }

        let caps = BEFORE_RE
            .captures(&norm)
            .ok_or_else(|| PatternError::Unknown(s.to_string()))?;
        let raw = &caps[1];
        let num: u32 = raw
            .parse()
            .map_err(|_| PatternError::bad_number(s, raw))?;
        if !(1..=HIDE_MAX).contains(&num) {
            return Err(PatternError::out_of_range(s, raw, "1..=99"));
        }
        let unit = HideUnit::from_label(&caps[2]).ok_or_else(|| PatternError::Unknown(s.to_string()))?;
        let anchor =
            HideAnchor::from_label(&caps[3]).ok_or_else(|| PatternError::Unknown(s.to_string()))?;
        Ok(HidePattern::Before { num, unit, anchor })
    }

    /// `"<num> <unit(s)> before <anchor>"`
    pub fn before(num: u32, unit: HideUnit, anchor: HideAnchor) -> HidePattern {
        HidePattern::Before { num, unit, anchor }
    }
}

impl fmt::Display for HidePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HidePattern::TaskIsDue => f.write_str("task is due"),
            HidePattern::GivenDate => f.write_str("given date"),
            HidePattern::Before { num, unit, anchor } => write!(
                f,
                "{} {} before {}",
                num,
                pluralize(*num, unit.name()),
                anchor.name()
            ),
        }
    }
}

impl FromStr for HidePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HidePattern::parse(s)
    }
}
