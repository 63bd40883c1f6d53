use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;

use super::{PatternError, day3, normalize, parse_day3, pluralize};
use crate::model::task::{NO_REPEAT, WITH_PARENT};

static EVERY_N_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^every (\S+) (days?|weeks?|months?|years?)$").expect("valid regex")
});

static NTH_WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^the (\S+) (\S+) every (\S+) months?$").expect("valid regex")
});

/// Calendar unit for `Every N <unit>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodUnit {
    pub fn name(self) -> &'static str {
        match self {
            PeriodUnit::Day => "Day",
            PeriodUnit::Week => "Week",
            PeriodUnit::Month => "Month",
            PeriodUnit::Year => "Year",
        }
    }

    /// Accepts singular or plural, any case.
    pub fn from_label(s: &str) -> Option<PeriodUnit> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_suffix('s').unwrap_or(&lower) {
            "day" => Some(PeriodUnit::Day),
            "week" => Some(PeriodUnit::Week),
            "month" => Some(PeriodUnit::Month),
            "year" => Some(PeriodUnit::Year),
            _ => None,
        }
    }
}

/// The named fixed-offset patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedInterval {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Semiannually,
    Yearly,
}

impl FixedInterval {
    const ALL: [FixedInterval; 8] = [
        FixedInterval::Daily,
        FixedInterval::Weekly,
        FixedInterval::Biweekly,
        FixedInterval::Monthly,
        FixedInterval::Bimonthly,
        FixedInterval::Quarterly,
        FixedInterval::Semiannually,
        FixedInterval::Yearly,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FixedInterval::Daily => "Daily",
            FixedInterval::Weekly => "Weekly",
            FixedInterval::Biweekly => "Biweekly",
            FixedInterval::Monthly => "Monthly",
            FixedInterval::Bimonthly => "Bimonthly",
            FixedInterval::Quarterly => "Quarterly",
            FixedInterval::Semiannually => "Semiannually",
            FixedInterval::Yearly => "Yearly",
        }
    }

    /// The offset this key stands for, as `(count, unit)`.
    pub fn period(self) -> (u32, PeriodUnit) {
        match self {
            FixedInterval::Daily => (1, PeriodUnit::Day),
            FixedInterval::Weekly => (1, PeriodUnit::Week),
            FixedInterval::Biweekly => (2, PeriodUnit::Week),
            FixedInterval::Monthly => (1, PeriodUnit::Month),
            FixedInterval::Bimonthly => (2, PeriodUnit::Month),
            FixedInterval::Quarterly => (3, PeriodUnit::Month),
            FixedInterval::Semiannually => (6, PeriodUnit::Month),
            FixedInterval::Yearly => (1, PeriodUnit::Year),
        }
    }
}

/// Which occurrence of a weekday within a month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

impl Ordinal {
    pub fn name(self) -> &'static str {
        match self {
            Ordinal::First => "first",
            Ordinal::Second => "second",
            Ordinal::Third => "third",
            Ordinal::Fourth => "fourth",
            Ordinal::Fifth => "fifth",
            Ordinal::Last => "last",
        }
    }

    pub fn from_label(s: &str) -> Option<Ordinal> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Some(Ordinal::First),
            "second" => Some(Ordinal::Second),
            "third" => Some(Ordinal::Third),
            "fourth" => Some(Ordinal::Fourth),
            "fifth" => Some(Ordinal::Fifth),
            "last" => Some(Ordinal::Last),
            _ => None,
        }
    }

    /// 1-based position counted from the start of the month; `None` for `Last`.
    pub fn position(self) -> Option<u32> {
        match self {
            Ordinal::First => Some(1),
            Ordinal::Second => Some(2),
            Ordinal::Third => Some(3),
            Ordinal::Fourth => Some(4),
            Ordinal::Fifth => Some(5),
            Ordinal::Last => None,
        }
    }
}

/// A parsed repeat pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatPattern {
    /// `Norepeat`
    NoRepeat,
    /// `WITHPARENT`: resolved against the parent task when it is needed
    WithParent,
    /// `Daily`, `Weekly`, … `Yearly`
    Fixed(FixedInterval),
    /// `Businessday`: next Monday–Friday
    BusinessDay,
    /// `Weekend`: next Saturday or Sunday
    Weekend,
    /// `Last day of every month`
    LastDayOfMonth,
    /// `Every 3 Weeks`
    Every { num: u32, unit: PeriodUnit },
    /// `Every Mon, Thu` (days kept sorted Monday first, without duplicates)
    EveryWeekday(Vec<Weekday>),
    /// `The last Fri every 1 months`
    NthWeekday {
        ordinal: Ordinal,
        weekday: Weekday,
        months: u32,
    },
}

impl RepeatPattern {
    /// Parse a repeat pattern string.
    pub fn parse(s: &str) -> Result<RepeatPattern, PatternError> {
        let norm = normalize(s);

        if norm == NO_REPEAT.to_lowercase() {
            return Ok(RepeatPattern::NoRepeat);
        }
        if norm == WITH_PARENT.to_lowercase() {
            return Ok(RepeatPattern::WithParent);
        }
        if let Some(fixed) = FixedInterval::ALL
            .iter()
            .find(|f| f.key().eq_ignore_ascii_case(&norm))
        {
            return Ok(RepeatPattern::Fixed(*fixed));
        }
        match norm.as_str() {
            "businessday" => return Ok(RepeatPattern::BusinessDay),
            "weekend" => return Ok(RepeatPattern::Weekend),
            "last day of every month" => return Ok(RepeatPattern::LastDayOfMonth),
            _ => {}
        }

        if let Some(caps) = EVERY_N_RE.captures(&norm) {
            let num = parse_count(s, &caps[1])?;
            let unit = PeriodUnit::from_label(&caps[2])
                .ok_or_else(|| PatternError::Unknown(s.to_string()))?;
            return Ok(RepeatPattern::Every { num, unit });
        }

        if let Some(caps) = NTH_WEEKDAY_RE.captures(&norm) {
            let ordinal =
                Ordinal::from_label(&caps[1]).ok_or_else(|| PatternError::Unknown(s.to_string()))?;
            let weekday =
                parse_day3(&caps[2]).ok_or_else(|| PatternError::Unknown(s.to_string()))?;
            let months = parse_count(s, &caps[3])?;
            return Ok(RepeatPattern::NthWeekday {
                ordinal,
                weekday,
                months,
            });
        }

        if let Some(list) = norm.strip_prefix("every ") {
            let mut days = Vec::new();
            for item in list.split(',') {
                let day = parse_day3(item).ok_or_else(|| PatternError::Unknown(s.to_string()))?;
                days.push(day);
            }
            return Ok(RepeatPattern::every_weekdays(days));
        }

        Err(PatternError::Unknown(s.to_string()))
    }

    /// `Every <num> <unit>`
    pub fn every(num: u32, unit: PeriodUnit) -> RepeatPattern {
        RepeatPattern::Every { num, unit }
    }

    /// `Every <day>, <day>…`; order and duplicates in `days` do not matter.
    pub fn every_weekdays(days: impl IntoIterator<Item = Weekday>) -> RepeatPattern {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        RepeatPattern::EveryWeekday(days)
    }

    /// `The <ordinal> <day> every <months> months`
    pub fn nth_weekday(ordinal: Ordinal, weekday: Weekday, months: u32) -> RepeatPattern {
        RepeatPattern::NthWeekday {
            ordinal,
            weekday,
            months,
        }
    }

    /// False for `Norepeat` and `WITHPARENT`, which carry no date rule of their own.
    pub fn is_date_rule(&self) -> bool {
        !matches!(self, RepeatPattern::NoRepeat | RepeatPattern::WithParent)
    }
}

impl fmt::Display for RepeatPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatPattern::NoRepeat => f.write_str(NO_REPEAT),
            RepeatPattern::WithParent => f.write_str(WITH_PARENT),
            RepeatPattern::Fixed(fixed) => f.write_str(fixed.key()),
            RepeatPattern::BusinessDay => f.write_str("Businessday"),
            RepeatPattern::Weekend => f.write_str("Weekend"),
            RepeatPattern::LastDayOfMonth => f.write_str("Last day of every month"),
            RepeatPattern::Every { num, unit } => {
                write!(f, "Every {} {}", num, pluralize(*num, unit.name()))
            }
            RepeatPattern::EveryWeekday(days) => {
                let names: Vec<&str> = days.iter().map(|d| day3(*d)).collect();
                write!(f, "Every {}", names.join(", "))
            }
            RepeatPattern::NthWeekday {
                ordinal,
                weekday,
                months,
            } => write!(
                f,
                "The {} {} every {} months",
                ordinal.name(),
                day3(*weekday),
                months
            ),
        }
    }
}

impl FromStr for RepeatPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepeatPattern::parse(s)
    }
}

/// A repeat count must be a positive integer.
fn parse_count(pattern: &str, raw: &str) -> Result<u32, PatternError> {
    let num: u32 = raw
        .parse()
        .map_err(|_| PatternError::bad_number(pattern, raw))?;
    if num == 0 {
        return Err(PatternError::out_of_range(pattern, raw, "at least 1"));
    }
    Ok(num)
}
