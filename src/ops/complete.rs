use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::hierarchy::refresh_project_due;
use super::recurrence::generate_next;
use crate::model::config::EngineConfig;
use crate::model::task::{TaskId, TaskType};
use crate::model::tree::{TaskError, TaskTree};

/// Outcome of completing a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The task was already completed; nothing changed
    AlreadyCompleted,
    /// The task was completed and does not repeat
    Completed,
    /// The task was completed and its next instance created
    Recurred(TaskId),
    /// A checklist item was completed and moved to the end of its list
    Renumbered { importance: i32 },
}

/// Mark a task completed at `now`.
///
/// A checklist item moves to the bottom of its checklist. Any other task
/// produces its next instance when it repeats. Enclosing projects get their
/// due date recomputed either way.
pub fn complete(
    tree: &mut TaskTree,
    id: TaskId,
    now: NaiveDateTime,
    config: &EngineConfig,
) -> Result<Completion, TaskError> {
    let task = tree.task_mut(id)?;
    if task.is_completed() {
        return Ok(Completion::AlreadyCompleted);
    }
    task.completed = Some(now);
    task.mark_dirty();
    let is_item = task.task_type == TaskType::ChecklistItem;
    let parent = task.parent_id;

    let outcome = if is_item {
        Completion::Renumbered {
            importance: move_to_bottom(tree, id)?,
        }
    } else {
        match generate_next(tree, id, config)? {
            Some(next) => Completion::Recurred(next),
            None => Completion::Completed,
        }
    };

    if let Some(parent) = parent {
        refresh_project_due(tree, parent);
    }
    info!(task = %id, outcome = ?outcome, "completed task");
    Ok(outcome)
}

/// Clear a task's completion date.
///
/// Returns `false` when the task was not completed. A reopened checklist
/// item keeps its slot at the bottom of the list.
pub fn reopen(tree: &mut TaskTree, id: TaskId) -> Result<bool, TaskError> {
    let task = tree.task_mut(id)?;
    if !task.is_completed() {
        return Ok(false);
    }
    task.completed = None;
    task.mark_dirty();
    if let Some(parent) = task.parent_id {
        refresh_project_due(tree, parent);
    }
    debug!(task = %id, "reopened task");
    Ok(true)
}

/// Close the gap a checklist item leaves and give it the last slot.
fn move_to_bottom(tree: &mut TaskTree, id: TaskId) -> Result<i32, TaskError> {
    let task = tree.task(id)?;
    let old = task.importance;
    let Some(checklist) = task.parent_id else {
        return Ok(old);
    };

    let mut last = old;
    for sibling in tree.children(checklist) {
        if sibling == id {
            continue;
        }
        let Some(sibling) = tree.get_mut(sibling) else {
            continue;
        };
        if sibling.importance > old {
            sibling.importance -= 1;
            sibling.mark_dirty();
        }
        last = last.max(sibling.importance + 1);
    }

    let task = tree.task_mut(id)?;
    if task.importance != last {
        task.importance = last;
        task.mark_dirty();
    }
    Ok(last)
}
