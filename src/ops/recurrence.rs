use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use super::dates::{AdvanceError, advance, shift};
use super::derive::{update_alarm, update_hide};
use crate::model::config::EngineConfig;
use crate::model::task::{NO_REPEAT, RepeatFrom, Task, TaskId, TaskType};
use crate::model::tree::{TaskError, TaskTree};
use crate::parse::{PatternError, RepeatPattern};

/// The recurrence rule that applies to a task once `WITHPARENT` is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRule {
    /// No pattern, `Norepeat`, or an ancestor that does not repeat
    NoRepeat,
    /// `WITHPARENT` all the way up to a task without a parent
    Orphaned,
    /// A date rule and the flag saying what it is anchored on
    Rule(RepeatPattern, RepeatFrom),
}

/// Resolve the repeat rule for `id`, following `WITHPARENT` up the tree.
pub fn resolve_rule(tree: &TaskTree, id: TaskId) -> Result<ResolvedRule, PatternError> {
    let chain = std::iter::once(id).chain(tree.ancestors(id));
    for tid in chain {
        let Some(task) = tree.get(tid) else {
            break;
        };
        let Some(raw) = task.repeat_pattern.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Ok(ResolvedRule::NoRepeat);
        };
        match RepeatPattern::parse(raw)? {
            RepeatPattern::NoRepeat => return Ok(ResolvedRule::NoRepeat),
            RepeatPattern::WithParent => continue,
            rule => return Ok(ResolvedRule::Rule(rule, task.repeat_from)),
        }
    }
    Ok(ResolvedRule::Orphaned)
}

/// Create the next instance of a recurring task and return its id.
///
/// Returns `Ok(None)` when the task does not repeat, when its pattern cannot
/// be parsed, or when the next date cannot be computed; those cases are
/// logged and leave the original untouched. Checklist items never recur.
pub fn generate_next(
    tree: &mut TaskTree,
    id: TaskId,
    config: &EngineConfig,
) -> Result<Option<TaskId>, TaskError> {
    let original = tree.task(id)?.clone();
    if original.task_type == TaskType::ChecklistItem || !original.repeats() {
        return Ok(None);
    }

    let rule = match resolve_rule(tree, id) {
        Ok(ResolvedRule::NoRepeat) => return Ok(None),
        Ok(ResolvedRule::Orphaned) => {
            warn!(task = %id, "WITHPARENT repeat pattern but no parent to inherit from; copying without advancing dates");
            None
        }
        Ok(ResolvedRule::Rule(rule, from)) => Some((rule, from)),
        Err(e) => {
            warn!(task = %id, error = %e, "cannot parse repeat pattern; no new instance created");
            return Ok(None);
        }
    };

    let mut next = original.clone();
    next.completed = None;
    next.mark_dirty();

    if let Some((rule, from)) = &rule {
        if let Err(e) = advance_dates(&original, &mut next, rule, *from) {
            warn!(task = %id, pattern = %rule, error = %e, "cannot compute next occurrence; no new instance created");
            return Ok(None);
        }
        if let Err(e) = update_hide(&mut next) {
            warn!(task = %id, error = %e, "could not derive hide-until date for next instance");
        }
    }

    let next_id = tree.insert(next);
    debug!(task = %id, next = %next_id, "created next instance");

    if config.recurrence.reset_original {
        let original = tree.task_mut(id)?;
        original.repeat_pattern = Some(NO_REPEAT.to_string());
        original.mark_dirty();
    }
    Ok(Some(next_id))
}

/// Move due, start and alarm of `next` forward by one occurrence of `rule`.
fn advance_dates(
    original: &Task,
    next: &mut Task,
    rule: &RepeatPattern,
    from: RepeatFrom,
) -> Result<(), AdvanceError> {
    let anchor = |date: NaiveDateTime| match (from, original.completed) {
        (RepeatFrom::Completion, Some(done)) => done.date().and_time(date.time()),
        _ => date,
    };

    let mut offset: Option<Duration> = None;
    if let Some(due) = original.due_date {
        let new_due = advance(anchor(due), rule)?;
        let delta = new_due - due;
        next.due_date = Some(new_due);
        if let Some(start) = original.start_date {
            next.start_date = Some(shift(start, delta)?);
        }
        offset = Some(delta);
    } else if let Some(start) = original.start_date {
        next.start_date = Some(advance(anchor(start), rule)?);
    }

    let has_alarm_pattern = original
        .alarm_pattern
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    if has_alarm_pattern {
        if let Err(e) = update_alarm(next) {
            warn!(error = %e, "could not derive alarm for next instance");
        }
    } else if let Some(alarm) = original.alarm {
        next.alarm = Some(match offset {
            Some(delta) => shift(alarm, delta)?,
            None => advance(anchor(alarm), rule)?,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn repeating(pattern: &str) -> Task {
        let mut task = Task::new("Pay rent");
        task.repeat_pattern = Some(pattern.into());
        task
    }

    #[test]
    fn test_no_pattern_no_instance() {
        let mut tree = TaskTree::new();
        let id = tree.insert(Task::new("once"));
        assert_eq!(generate_next(&mut tree, id, &EngineConfig::default()), Ok(None));
        let id = tree.insert(repeating("Norepeat"));
        assert_eq!(generate_next(&mut tree, id, &EngineConfig::default()), Ok(None));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_from_due_date() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Monthly");
        task.due_date = Some(dt(2010, 1, 31));
        task.start_date = Some(dt(2010, 1, 25));
        task.completed = Some(dt(2010, 3, 3));
        let id = tree.insert(task);

        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        let next = tree.get(next).unwrap();
        assert_eq!(next.due_date, Some(dt(2010, 2, 28)));
        // start keeps its distance to due: 28 days later
        assert_eq!(next.start_date, Some(dt(2010, 2, 22)));
        assert_eq!(next.completed, None);
        assert_eq!(next.title, "Pay rent");
        assert_ne!(next.id, id);
    }

    #[test]
    fn test_from_completion_keeps_due_time() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Weekly");
        task.due_date = Some(at(2010, 6, 1, 9, 30));
        task.repeat_from = RepeatFrom::Completion;
        task.completed = Some(at(2010, 6, 10, 18, 45));
        let id = tree.insert(task);

        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(tree.get(next).unwrap().due_date, Some(at(2010, 6, 17, 9, 30)));
    }

    #[test]
    fn test_start_only() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Every 3 days");
        task.start_date = Some(dt(2010, 6, 1));
        task.alarm = Some(at(2010, 6, 1, 8, 0));
        let id = tree.insert(task);

        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        let next = tree.get(next).unwrap();
        assert_eq!(next.start_date, Some(dt(2010, 6, 4)));
        assert_eq!(next.due_date, None);
        // no offset: the alarm is advanced on its own
        assert_eq!(next.alarm, Some(at(2010, 6, 4, 8, 0)));
    }

    #[test]
    fn test_alarm_shifted_by_offset() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Businessday");
        task.due_date = Some(at(2010, 6, 18, 17, 0)); // Friday
        task.alarm = Some(at(2010, 6, 18, 12, 0));
        let id = tree.insert(task);

        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        let next = tree.get(next).unwrap();
        assert_eq!(next.due_date, Some(at(2010, 6, 21, 17, 0)));
        assert_eq!(next.alarm, Some(at(2010, 6, 21, 12, 0)));
    }

    #[test]
    fn test_alarm_and_hide_rederived_from_patterns() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Yearly");
        task.due_date = Some(at(2011, 3, 1, 10, 0));
        task.alarm_pattern = Some("2 hours".into());
        task.alarm = Some(at(2011, 3, 1, 8, 0));
        task.hide_pattern = Some("2 weeks before due".into());
        task.hide_until = Some(at(2011, 2, 15, 10, 0));
        let id = tree.insert(task);

        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        let next = tree.get(next).unwrap();
        assert_eq!(next.due_date, Some(at(2012, 3, 1, 10, 0)));
        assert_eq!(next.alarm, Some(at(2012, 3, 1, 8, 0)));
        assert_eq!(next.hide_until, Some(at(2012, 2, 16, 10, 0)));
    }

    #[test]
    fn test_original_reset() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Daily");
        task.due_date = Some(dt(2010, 6, 15));
        let id = tree.insert(task);

        generate_next(&mut tree, id, &EngineConfig::default()).unwrap();
        assert_eq!(tree.get(id).unwrap().repeat_pattern.as_deref(), Some("Norepeat"));

        let mut config = EngineConfig::default();
        config.recurrence.reset_original = false;
        let mut task = repeating("Daily");
        task.due_date = Some(dt(2010, 6, 15));
        let id = tree.insert(task);
        let next = generate_next(&mut tree, id, &config).unwrap().unwrap();
        assert_eq!(tree.get(id).unwrap().repeat_pattern.as_deref(), Some("Daily"));
        assert_eq!(tree.get(next).unwrap().repeat_pattern.as_deref(), Some("Daily"));
    }

    #[test]
    fn test_with_parent_uses_parent_rule() {
        let mut tree = TaskTree::new();
        let mut project = repeating("Weekly").with_type(TaskType::Project);
        project.repeat_from = RepeatFrom::Completion;
        let project = tree.insert(project);

        let mut task = repeating("WITHPARENT");
        task.parent_id = Some(project);
        task.due_date = Some(dt(2010, 6, 1));
        task.completed = Some(dt(2010, 6, 10));
        let id = tree.insert(task);

        assert_eq!(
            resolve_rule(&tree, id).unwrap(),
            ResolvedRule::Rule(
                RepeatPattern::parse("Weekly").unwrap(),
                RepeatFrom::Completion
            )
        );
        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(tree.get(next).unwrap().due_date, Some(dt(2010, 6, 17)));
        assert_eq!(tree.get(next).unwrap().parent_id, Some(project));
    }

    #[test]
    fn test_with_parent_parent_does_not_repeat() {
        let mut tree = TaskTree::new();
        let project = tree.insert(Task::new("P").with_type(TaskType::Project));
        let mut task = repeating("WITHPARENT");
        task.parent_id = Some(project);
        task.due_date = Some(dt(2010, 6, 1));
        let id = tree.insert(task);
        assert_eq!(resolve_rule(&tree, id), Ok(ResolvedRule::NoRepeat));
        assert_eq!(generate_next(&mut tree, id, &EngineConfig::default()), Ok(None));
    }

    #[test]
    fn test_with_parent_orphan_copies_without_advancing() {
        let mut tree = TaskTree::new();
        let mut task = repeating("WITHPARENT");
        task.due_date = Some(dt(2010, 6, 1));
        task.start_date = Some(dt(2010, 5, 20));
        task.completed = Some(dt(2010, 6, 2));
        let id = tree.insert(task);

        let next = generate_next(&mut tree, id, &EngineConfig::default())
            .unwrap()
            .unwrap();
        let next = tree.get(next).unwrap();
        assert_eq!(next.due_date, Some(dt(2010, 6, 1)));
        assert_eq!(next.start_date, Some(dt(2010, 5, 20)));
        assert_eq!(next.completed, None);
        assert_eq!(tree.get(id).unwrap().repeat_pattern.as_deref(), Some("Norepeat"));
    }

    #[test]
    fn test_bad_pattern_creates_nothing() {
        let mut tree = TaskTree::new();
        let mut task = repeating("Every blue moon");
        task.due_date = Some(dt(2010, 6, 1));
        let id = tree.insert(task);
        assert_eq!(generate_next(&mut tree, id, &EngineConfig::default()), Ok(None));
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.get(id).unwrap().repeat_pattern.as_deref(),
            Some("Every blue moon")
        );
    }

    #[test]
    fn test_missing_fifth_weekday_creates_nothing() {
        let mut tree = TaskTree::new();
        let mut task = repeating("The fifth Fri every 2 months");
        task.due_date = Some(dt(2010, 6, 15));
        let id = tree.insert(task);
        assert_eq!(generate_next(&mut tree, id, &EngineConfig::default()), Ok(None));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_checklist_item_never_recurs() {
        let mut tree = TaskTree::new();
        let mut item = repeating("Daily").with_type(TaskType::ChecklistItem);
        item.due_date = Some(dt(2010, 6, 1));
        let id = tree.insert(item);
        assert_eq!(generate_next(&mut tree, id, &EngineConfig::default()), Ok(None));
    }

    #[test]
    fn test_missing_task() {
        let mut tree = TaskTree::new();
        assert_eq!(
            generate_next(&mut tree, TaskId(3), &EngineConfig::default()),
            Err(TaskError::NotFound(TaskId(3)))
        );
    }
}
