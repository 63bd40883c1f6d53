//! Keeps `alarm` and `hide_until` in step with their patterns and the
//! task's due/start dates.
//!
//! Both derivations leave the derived field untouched when the pattern is
//! malformed and report the problem through the returned `Err`; a missing
//! anchor date is not an error, just nothing to compute yet.

use chrono::NaiveDateTime;
use tracing::warn;

use super::dates::sub_period;
use crate::model::task::Task;
use crate::parse::repeat::PeriodUnit;
use crate::parse::{AlarmPattern, HideAnchor, HidePattern, HideUnit, PatternError};

/// What a derivation did to the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// The derived field was recomputed from its pattern
    Applied,
    /// No pattern is set
    NoPattern,
    /// The pattern needs a due/start date the task does not have; field unchanged
    MissingAnchor,
    /// The field is authoritative (`given date`) and was left alone
    Manual,
}

/// Recompute `alarm` from `alarm_pattern` and the due date.
pub fn update_alarm(task: &mut Task) -> Result<Derivation, PatternError> {
    let Some(raw) = non_empty(task.alarm_pattern.as_deref()) else {
        return Ok(Derivation::NoPattern);
    };
    let pattern = AlarmPattern::parse(raw)?;
    let Some(due) = task.due_date else {
        return Ok(Derivation::MissingAnchor);
    };
    let Some(alarm) = due.checked_sub_signed(pattern.offset()) else {
        return Ok(Derivation::MissingAnchor);
    };
    if task.alarm != Some(alarm) {
        task.alarm = Some(alarm);
        task.mark_dirty();
    }
    Ok(Derivation::Applied)
}

/// Recompute `hide_until` from `hide_pattern` and the due/start dates.
pub fn update_hide(task: &mut Task) -> Result<Derivation, PatternError> {
    let Some(raw) = non_empty(task.hide_pattern.as_deref()) else {
        if task.hide_until.is_some() {
            task.hide_until = None;
            task.mark_dirty();
        }
        return Ok(Derivation::NoPattern);
    };

    let hide_until = match HidePattern::parse(raw)? {
        HidePattern::GivenDate => {
            if task.hide_until.is_none() {
                warn!(task = %task.id, "hide pattern is 'given date' but no hide-until date is set");
            }
            return Ok(Derivation::Manual);
        }
        HidePattern::TaskIsDue => task.due_date.or(task.start_date),
        HidePattern::Before { num, unit, anchor } => {
            let base = match anchor {
                HideAnchor::Due => task.due_date.or(task.start_date),
                HideAnchor::Start => task.start_date.or(task.due_date),
            };
            base.and_then(|base| hide_before(base, num, unit))
        }
    };

    let Some(hide_until) = hide_until else {
        return Ok(Derivation::MissingAnchor);
    };
    if task.hide_until != Some(hide_until) {
        task.hide_until = Some(hide_until);
        task.mark_dirty();
    }
    Ok(Derivation::Applied)
}

/// Re-derive both fields, logging pattern problems instead of returning them.
pub fn refresh_derived(task: &mut Task) {
    if let Err(e) = update_alarm(task) {
        warn!(task = %task.id, error = %e, "could not derive alarm");
    }
    if let Err(e) = update_hide(task) {
        warn!(task = %task.id, error = %e, "could not derive hide-until date");
    }
}

fn hide_before(base: NaiveDateTime, num: u32, unit: HideUnit) -> Option<NaiveDateTime> {
    let unit = match unit {
        HideUnit::Day => PeriodUnit::Day,
        HideUnit::Week => PeriodUnit::Week,
        HideUnit::Month => PeriodUnit::Month,
    };
    sub_period(base, num, unit).ok()
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
