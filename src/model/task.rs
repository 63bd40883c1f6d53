use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repeat pattern value meaning "never recurs".
pub const NO_REPEAT: &str = "Norepeat";
/// Repeat pattern value meaning "use the parent's recurrence settings".
pub const WITH_PARENT: &str = "WITHPARENT";

/// Stable task identity, allocated by [`crate::model::TaskTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Task,
    Project,
    Checklist,
    ChecklistItem,
    Call,
    Email,
    Sms,
    ReturnCall,
}

impl TaskType {
    /// Projects and checklists may own children; nothing else may.
    pub fn is_container(self) -> bool {
        matches!(self, TaskType::Project | TaskType::Checklist)
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskType::Task => "task",
            TaskType::Project => "project",
            TaskType::Checklist => "checklist",
            TaskType::ChecklistItem => "checklist_item",
            TaskType::Call => "call",
            TaskType::Email => "email",
            TaskType::Sms => "sms",
            TaskType::ReturnCall => "return_call",
        }
    }

    /// Accepts the serialized label, with `-` or no separator as well.
    pub fn from_label(s: &str) -> Option<TaskType> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "task" => Some(TaskType::Task),
            "project" => Some(TaskType::Project),
            "checklist" => Some(TaskType::Checklist),
            "checklist_item" | "checklistitem" => Some(TaskType::ChecklistItem),
            "call" => Some(TaskType::Call),
            "email" => Some(TaskType::Email),
            "sms" => Some(TaskType::Sms),
            "return_call" | "returncall" => Some(TaskType::ReturnCall),
            _ => None,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a recurring task's next dates are computed from.
///
/// Stored as `0` (due/start date) or `1` (completion date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum RepeatFrom {
    #[default]
    DueDate,
    Completion,
}

impl From<u8> for RepeatFrom {
    fn from(v: u8) -> Self {
        if v == 1 {
            RepeatFrom::Completion
        } else {
            RepeatFrom::DueDate
        }
    }
}

impl From<RepeatFrom> for u8 {
    fn from(v: RepeatFrom) -> u8 {
        match v {
            RepeatFrom::DueDate => 0,
            RepeatFrom::Completion => 1,
        }
    }
}

/// A task record: the fields the recurrence and hierarchy rules read and write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,

    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    /// Earliest due date among open children (projects only)
    #[serde(default)]
    pub due_date_project: Option<NaiveDateTime>,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed: Option<NaiveDateTime>,

    #[serde(default)]
    pub repeat_pattern: Option<String>,
    #[serde(default)]
    pub repeat_from: RepeatFrom,

    #[serde(default)]
    pub alarm: Option<NaiveDateTime>,
    #[serde(default)]
    pub alarm_pattern: Option<String>,
    #[serde(default)]
    pub hide_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub hide_pattern: Option<String>,

    /// Position among checklist siblings (1-based)
    #[serde(default)]
    pub importance: i32,

    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether the engine changed this task since the flag was last cleared
    #[serde(skip)]
    pub dirty: bool,
}

impl Task {
    /// Create a new, unsaved plain task. The id is assigned on insertion into a tree.
    pub fn new(title: impl Into<String>) -> Self {
        Task {
            id: TaskId::default(),
            parent_id: None,
            title: title.into(),
            task_type: TaskType::Task,
            due_date: None,
            due_date_project: None,
            start_date: None,
            completed: None,
            repeat_pattern: None,
            repeat_from: RepeatFrom::DueDate,
            alarm: None,
            alarm_pattern: None,
            hide_until: None,
            hide_pattern: None,
            importance: 0,
            context: None,
            goal: None,
            folder: None,
            tags: Vec::new(),
            dirty: true,
        }
    }

    pub fn with_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    /// Due date used when ordering projects against their children:
    /// the earlier of the own due date and the propagated one.
    pub fn effective_due(&self) -> Option<NaiveDateTime> {
        if self.task_type != TaskType::Project {
            return self.due_date;
        }
        match (self.due_date, self.due_date_project) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// True when the repeat pattern asks for a new instance on completion.
    pub fn repeats(&self) -> bool {
        self.repeat_pattern
            .as_deref()
            .map(str::trim)
            .is_some_and(|p| !p.is_empty() && !p.eq_ignore_ascii_case(NO_REPEAT))
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.parent_id == other.parent_id
            && self.title == other.title
            && self.task_type == other.task_type
            && self.due_date == other.due_date
            && self.due_date_project == other.due_date_project
            && self.start_date == other.start_date
            && self.completed == other.completed
            && self.repeat_pattern == other.repeat_pattern
            && self.repeat_from == other.repeat_from
            && self.alarm == other.alarm
            && self.alarm_pattern == other.alarm_pattern
            && self.hide_until == other.hide_until
            && self.hide_pattern == other.hide_pattern
            && self.importance == other.importance
            && self.context == other.context
            && self.goal == other.goal
            && self.folder == other.folder
            && self.tags == other.tags
    }
}

impl Eq for Task {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeats() {
        let mut task = Task::new("water plants");
        assert!(!task.repeats());
        task.repeat_pattern = Some("Norepeat".into());
        assert!(!task.repeats());
        task.repeat_pattern = Some("norepeat".into());
        assert!(!task.repeats());
        task.repeat_pattern = Some("Weekly".into());
        assert!(task.repeats());
    }

    #[test]
    fn test_repeat_from_serializes_as_integer() {
        let mut task = Task::new("x");
        task.repeat_from = RepeatFrom::Completion;
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["repeat_from"], 1);
        assert_eq!(json["type"], "task");

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back.repeat_from, RepeatFrom::Completion);
        assert!(!back.dirty);
    }

    #[test]
    fn test_effective_due_for_project() {
        let d1 = chrono::NaiveDate::from_ymd_opt(2012, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let d2 = d1 - chrono::Duration::days(3);
        let mut project = Task::new("p").with_type(TaskType::Project);
        project.due_date = Some(d1);
        assert_eq!(project.effective_due(), Some(d1));
        project.due_date_project = Some(d2);
        assert_eq!(project.effective_due(), Some(d2));

        let mut plain = Task::new("t");
        plain.due_date_project = Some(d2);
        assert_eq!(plain.effective_due(), None);
    }

    #[test]
    fn test_task_type_labels() {
        for t in [
            TaskType::Task,
            TaskType::Project,
            TaskType::Checklist,
            TaskType::ChecklistItem,
            TaskType::Call,
            TaskType::Email,
            TaskType::Sms,
            TaskType::ReturnCall,
        ] {
            assert_eq!(TaskType::from_label(t.label()), Some(t));
        }
        assert_eq!(TaskType::from_label("nonsense"), None);
        assert!(TaskType::Project.is_container());
        assert!(!TaskType::ChecklistItem.is_container());
    }
}
