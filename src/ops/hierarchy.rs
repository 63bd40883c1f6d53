use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use tracing::debug;

use super::derive::refresh_derived;
use crate::model::config::EngineConfig;
use crate::model::task::{Task, TaskId, TaskType};
use crate::model::tree::{TaskError, TaskTree};

// ---------------------------------------------------------------------------
// Type consistency
// ---------------------------------------------------------------------------

/// Normalize task types below and including `id`.
///
/// - Under a checklist, a task becomes a checklist item.
/// - Anywhere else a checklist item is demoted to a plain task.
/// - Projects and checklists keep their children; any other task hands its
///   children up to its own parent before they are normalized in turn.
///
/// Running it twice changes nothing the second time.
pub fn fix_task_type(tree: &mut TaskTree, id: TaskId) -> Result<(), TaskError> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![id];

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let parent_type = tree.parent(id).map(|p| p.task_type);
        let task = tree.task_mut(id)?;

        let new_type = match parent_type {
            Some(TaskType::Checklist) => TaskType::ChecklistItem,
            _ if task.task_type == TaskType::ChecklistItem => TaskType::Task,
            _ => task.task_type,
        };
        if new_type != task.task_type {
            debug!(task = %id, from = %task.task_type, to = %new_type, "coercing task type");
            task.task_type = new_type;
            task.mark_dirty();
        }
        let own_parent = task.parent_id;

        let children = tree.children(id);
        if !new_type.is_container() {
            for &child in &children {
                tree.set_parent(child, own_parent)?;
            }
        }
        stack.extend(children.into_iter().rev());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Structural entry points
// ---------------------------------------------------------------------------

/// Move a task under `new_parent` (or to the top level with `None`).
pub fn change_parent(
    tree: &mut TaskTree,
    id: TaskId,
    new_parent: Option<TaskId>,
) -> Result<(), TaskError> {
    let old_parent = tree.task(id)?.parent_id;

    if let Some(pid) = new_parent {
        let parent = tree.task(pid)?;
        if tree.is_within(pid, id) {
            return Err(TaskError::Cycle { task: id, parent: pid });
        }
        if !parent.task_type.is_container() {
            return Err(TaskError::NotAContainer(pid));
        }
        if parent.task_type == TaskType::Checklist && old_parent != new_parent {
            let slot = next_importance(tree, pid);
            let task = tree.task_mut(id)?;
            task.importance = slot;
            task.mark_dirty();
        }
    }

    tree.set_parent(id, new_parent)?;
    fix_task_type(tree, id)?;

    settle_checklists(tree, [old_parent, new_parent, Some(id)]);
    if let Some(old) = old_parent {
        refresh_project_due(tree, old);
    }
    refresh_project_due(tree, id);
    Ok(())
}

/// Change a task's type and re-normalize its subtree.
///
/// The hierarchy wins over the request: asking for a plain task under a
/// checklist still yields a checklist item.
pub fn change_type(tree: &mut TaskTree, id: TaskId, new_type: TaskType) -> Result<(), TaskError> {
    let task = tree.task_mut(id)?;
    if task.task_type != new_type {
        task.task_type = new_type;
        if new_type != TaskType::Project && task.due_date_project.is_some() {
            task.due_date_project = None;
        }
        task.mark_dirty();
    }
    let parent = task.parent_id;

    fix_task_type(tree, id)?;

    settle_checklists(tree, [Some(id), parent]);
    refresh_project_due(tree, id);
    Ok(())
}

/// Insert a new task, optionally under a parent container.
///
/// When the parent is a project, empty context/goal/folder (and tags) are
/// copied from it according to `config.inherit`. A new checklist item goes
/// to the end of its checklist.
pub fn create_task(
    tree: &mut TaskTree,
    mut task: Task,
    parent: Option<TaskId>,
    config: &EngineConfig,
) -> Result<TaskId, TaskError> {
    task.parent_id = None;
    if let Some(pid) = parent {
        let p = tree.task(pid)?;
        if !p.task_type.is_container() {
            return Err(TaskError::NotAContainer(pid));
        }
        if p.task_type == TaskType::Project {
            inherit_from(&mut task, p, config);
        }
        if p.task_type == TaskType::Checklist {
            task.importance = next_importance(tree, pid);
        }
        task.parent_id = Some(pid);
    }
    refresh_derived(&mut task);

    let id = tree.insert(task);
    fix_task_type(tree, id)?;
    refresh_project_due(tree, id);
    Ok(id)
}

fn inherit_from(task: &mut Task, project: &Task, config: &EngineConfig) {
    let inherit = &config.inherit;
    if inherit.context && task.context.is_none() {
        task.context = project.context.clone();
    }
    if inherit.goal && task.goal.is_none() {
        task.goal = project.goal.clone();
    }
    if inherit.folder && task.folder.is_none() {
        task.folder = project.folder.clone();
    }
    if inherit.tags {
        for tag in &project.tags {
            if !task.tags.contains(tag) {
                task.tags.push(tag.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Due dates
// ---------------------------------------------------------------------------

/// Set a task's due date, re-derive its alarm and hide date, and pull the
/// change up into the enclosing projects.
pub fn set_due_date(
    tree: &mut TaskTree,
    id: TaskId,
    due: Option<NaiveDateTime>,
) -> Result<(), TaskError> {
    let task = tree.task_mut(id)?;
    if task.due_date != due {
        task.due_date = due;
        task.mark_dirty();
    }
    refresh_derived(task);
    refresh_project_due(tree, id);
    Ok(())
}

/// Recompute `due_date_project` for `id` and every ancestor that is a
/// project: the earliest effective due date among open children. Tasks on
/// the chain that are not projects are skipped.
pub fn refresh_project_due(tree: &mut TaskTree, id: TaskId) {
    let mut chain = vec![id];
    chain.extend(tree.ancestors(id));

    for pid in chain {
        let Some(task) = tree.get(pid) else {
            break;
        };
        if task.task_type != TaskType::Project {
            continue;
        }
        let earliest = tree
            .children(pid)
            .into_iter()
            .filter_map(|c| tree.get(c))
            .filter(|c| !c.is_completed())
            .filter_map(Task::effective_due)
            .min();
        if let Some(project) = tree.get_mut(pid)
            && project.due_date_project != earliest
        {
            project.due_date_project = earliest;
            project.mark_dirty();
        }
    }
}

// ---------------------------------------------------------------------------
// Checklist ordering
// ---------------------------------------------------------------------------

/// The importance slot after the last child of `parent`.
pub fn next_importance(tree: &TaskTree, parent: TaskId) -> i32 {
    tree.children(parent)
        .into_iter()
        .filter_map(|c| tree.get(c))
        .map(|c| c.importance)
        .max()
        .map_or(1, |m| m + 1)
}

/// Rewrite a checklist's item importances as 1, 2, 3… keeping their order.
pub fn renumber_checklist(tree: &mut TaskTree, checklist: TaskId) {
    let mut items: Vec<(i32, TaskId)> = tree
        .children(checklist)
        .into_iter()
        .filter_map(|c| tree.get(c))
        .map(|c| (c.importance, c.id))
        .collect();
    items.sort();
    for (slot, (_, item)) in (1..).zip(items) {
        if let Some(task) = tree.get_mut(item)
            && task.importance != slot
        {
            task.importance = slot;
            task.mark_dirty();
        }
    }
}

fn settle_checklists(tree: &mut TaskTree, ids: impl IntoIterator<Item = Option<TaskId>>) {
    for id in ids.into_iter().flatten() {
        if tree.get(id).is_some_and(|t| t.task_type == TaskType::Checklist) {
            renumber_checklist(tree, id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
