use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::model::task::{Task, TaskId};
use crate::ops::complete::Completion;
use crate::ops::derive::Derivation;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct OccurrencesJson {
    pub pattern: String,
    pub anchor: NaiveDateTime,
    pub occurrences: Vec<NaiveDateTime>,
}

#[derive(Serialize)]
pub struct DerivedJson {
    pub pattern: String,
    pub status: &'static str,
    pub value: Option<NaiveDateTime>,
}

#[derive(Serialize)]
pub struct PatternKindJson {
    pub kind: &'static str,
    pub canonical: String,
}

#[derive(Serialize)]
pub struct PatternJson {
    pub input: String,
    pub matches: Vec<PatternKindJson>,
}

#[derive(Serialize)]
pub struct BuiltJson {
    pub pattern: String,
}

#[derive(Serialize)]
pub struct ChangeJson<'a> {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_task: Option<TaskId>,
    pub saved: bool,
    pub changed: Vec<&'a Task>,
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `2010-06-15` at midnight, `2010-06-15 09:30` otherwise.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else if dt.second() == 0 {
        dt.format("%Y-%m-%d %H:%M").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub fn derivation_label(d: Derivation) -> &'static str {
    match d {
        Derivation::Applied => "applied",
        Derivation::NoPattern => "no-pattern",
        Derivation::MissingAnchor => "missing-anchor",
        Derivation::Manual => "manual",
    }
}

/// One line per task: id, type, title, then whichever dates are set.
pub fn format_task_line(task: &Task) -> String {
    let mut line = format!("#{} [{}] {}", task.id, task.task_type, task.title);
    if let Some(parent) = task.parent_id {
        line.push_str(&format!("  parent:#{}", parent));
    }
    let dates = [
        ("due", task.due_date),
        ("project-due", task.due_date_project),
        ("start", task.start_date),
        ("alarm", task.alarm),
        ("hide-until", task.hide_until),
        ("done", task.completed),
    ];
    for (label, value) in dates {
        if let Some(value) = value {
            line.push_str(&format!("  {}:{}", label, format_datetime(value)));
        }
    }
    if let Some(repeat) = task.repeat_pattern.as_deref() {
        line.push_str(&format!("  repeat:{:?}", repeat));
    }
    if task.importance != 0 {
        line.push_str(&format!("  #{}", task.importance));
    }
    line
}

pub fn describe_completion(id: TaskId, outcome: &Completion) -> String {
    match outcome {
        Completion::AlreadyCompleted => format!("#{} was already completed", id),
        Completion::Completed => format!("completed #{}", id),
        Completion::Recurred(next) => format!("completed #{}; next instance is #{}", id, next),
        Completion::Renumbered { importance } => {
            format!("completed #{}; moved to position {}", id, importance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskType;
    use chrono::NaiveDate;

    #[test]
    fn test_format_datetime() {
        let d = NaiveDate::from_ymd_opt(2010, 6, 15).unwrap();
        assert_eq!(format_datetime(d.and_hms_opt(0, 0, 0).unwrap()), "2010-06-15");
        assert_eq!(format_datetime(d.and_hms_opt(9, 30, 0).unwrap()), "2010-06-15 09:30");
        assert_eq!(
            format_datetime(d.and_hms_opt(9, 30, 5).unwrap()),
            "2010-06-15 09:30:05"
        );
    }

    #[test]
    fn test_format_task_line() {
        let mut task = Task::new("milk").with_type(TaskType::ChecklistItem);
        task.id = TaskId(4);
        task.parent_id = Some(TaskId(1));
        task.importance = 2;
        task.due_date = NaiveDate::from_ymd_opt(2010, 6, 1).unwrap().and_hms_opt(0, 0, 0);
        assert_eq!(
            format_task_line(&task),
            "#4 [checklist_item] milk  parent:#1  due:2010-06-01  #2"
        );
    }

    #[test]
    fn test_describe_completion() {
        assert_eq!(
            describe_completion(TaskId(3), &Completion::Recurred(TaskId(9))),
            "completed #3; next instance is #9"
        );
        assert_eq!(
            describe_completion(TaskId(3), &Completion::Renumbered { importance: 3 }),
            "completed #3; moved to position 3"
        );
    }
}
