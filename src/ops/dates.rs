use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, Weekday};

use crate::parse::repeat::{Ordinal, PeriodUnit, RepeatPattern};
use crate::parse::day3;

/// Error type for date advancement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceError {
    #[error("pattern {0:?} has no date rule of its own")]
    NotADateRule(String),
    #[error("{year}-{month:02} has no {ordinal} {weekday}")]
    MissingOccurrence {
        ordinal: &'static str,
        weekday: &'static str,
        year: i32,
        month: u32,
    },
    #[error("date arithmetic out of range")]
    OutOfRange,
}

/// Compute the next occurrence after `anchor` for a repeat pattern.
///
/// The anchor's time of day is carried over unchanged. Month and year steps
/// clamp to the end of shorter months (Jan 31 + 1 month is Feb 28 or 29).
pub fn advance(anchor: NaiveDateTime, pattern: &RepeatPattern) -> Result<NaiveDateTime, AdvanceError> {
    match pattern {
        RepeatPattern::NoRepeat | RepeatPattern::WithParent => {
            Err(AdvanceError::NotADateRule(pattern.to_string()))
        }
        RepeatPattern::Fixed(fixed) => {
            let (num, unit) = fixed.period();
            add_period(anchor, num, unit)
        }
        RepeatPattern::Every { num, unit } => add_period(anchor, *num, *unit),
        RepeatPattern::BusinessDay => next_matching_day(anchor, |d| {
            !matches!(d, Weekday::Sat | Weekday::Sun)
        }),
        RepeatPattern::Weekend => {
            next_matching_day(anchor, |d| matches!(d, Weekday::Sat | Weekday::Sun))
        }
        RepeatPattern::EveryWeekday(days) => {
            if days.is_empty() {
                return Err(AdvanceError::NotADateRule(pattern.to_string()));
            }
            next_matching_day(anchor, |d| days.contains(&d))
        }
        RepeatPattern::LastDayOfMonth => {
            let first = anchor
                .date()
                .with_day(1)
                .ok_or(AdvanceError::OutOfRange)?;
            let next_month = first
                .checked_add_months(Months::new(1))
                .ok_or(AdvanceError::OutOfRange)?;
            let last = last_day_of_month(next_month.year(), next_month.month())?;
            Ok(last.and_time(anchor.time()))
        }
        RepeatPattern::NthWeekday {
            ordinal,
            weekday,
            months,
        } => {
            let target = anchor
                .date()
                .checked_add_months(Months::new(*months))
                .ok_or(AdvanceError::OutOfRange)?;
            let day = nth_weekday_of_month(target.year(), target.month(), *weekday, *ordinal)?;
            Ok(day.and_time(anchor.time()))
        }
    }
}

/// Add `num` calendar units to a date-time.
pub fn add_period(dt: NaiveDateTime, num: u32, unit: PeriodUnit) -> Result<NaiveDateTime, AdvanceError> {
    match unit {
        PeriodUnit::Day => dt.checked_add_days(Days::new(num.into())),
        PeriodUnit::Week => dt.checked_add_days(Days::new(u64::from(num) * 7)),
        PeriodUnit::Month => dt.checked_add_months(Months::new(num)),
        PeriodUnit::Year => num
            .checked_mul(12)
            .and_then(|m| dt.checked_add_months(Months::new(m))),
    }
    .ok_or(AdvanceError::OutOfRange)
}

/// Subtract `num` calendar units from a date-time.
pub fn sub_period(dt: NaiveDateTime, num: u32, unit: PeriodUnit) -> Result<NaiveDateTime, AdvanceError> {
    match unit {
        PeriodUnit::Day => dt.checked_sub_days(Days::new(num.into())),
        PeriodUnit::Week => dt.checked_sub_days(Days::new(u64::from(num) * 7)),
        PeriodUnit::Month => dt.checked_sub_months(Months::new(num)),
        PeriodUnit::Year => num
            .checked_mul(12)
            .and_then(|m| dt.checked_sub_months(Months::new(m))),
    }
    .ok_or(AdvanceError::OutOfRange)
}

/// Shift by a signed duration, failing instead of overflowing.
pub fn shift(dt: NaiveDateTime, by: Duration) -> Result<NaiveDateTime, AdvanceError> {
    dt.checked_add_signed(by).ok_or(AdvanceError::OutOfRange)
}

pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate, AdvanceError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .ok_or(AdvanceError::OutOfRange)
}

/// The `ordinal` occurrence of `weekday` in a month. `First`..`Fifth` count
/// from day one; `Last` counts back from the month end. A month without the
/// requested occurrence is an error, never a spill into the next month.
pub fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: Ordinal,
) -> Result<NaiveDate, AdvanceError> {
    match ordinal.position() {
        Some(n) => NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8).ok_or(
            AdvanceError::MissingOccurrence {
                ordinal: ordinal.name(),
                weekday: day3(weekday),
                year,
                month,
            },
        ),
        None => {
            let last = last_day_of_month(year, month)?;
            let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
            last.checked_sub_days(Days::new(back.into()))
                .ok_or(AdvanceError::OutOfRange)
        }
    }
}

/// First day strictly after `anchor` whose weekday satisfies `pred`,
/// looking at most one week ahead.
fn next_matching_day(
    anchor: NaiveDateTime,
    pred: impl Fn(Weekday) -> bool,
) -> Result<NaiveDateTime, AdvanceError> {
    for offset in 1..=7u64 {
        let candidate = anchor
            .checked_add_days(Days::new(offset))
            .ok_or(AdvanceError::OutOfRange)?;
        if pred(candidate.weekday()) {
            return Ok(candidate);
        }
    }
    Err(AdvanceError::OutOfRange)
}
