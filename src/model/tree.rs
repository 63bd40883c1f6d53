use std::collections::{BTreeMap, BTreeSet};

use super::task::{Task, TaskId};

/// Error type for task lookups and structural operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("cannot move task {task} under {parent}: it would become its own ancestor")]
    Cycle { task: TaskId, parent: TaskId },
    #[error("task {0} is not a project or checklist and cannot own subtasks")]
    NotAContainer(TaskId),
    #[error("task {task} names parent {parent}, which does not exist")]
    MissingParent { task: TaskId, parent: TaskId },
    #[error("task {0} is its own ancestor")]
    ParentLoop(TaskId),
}

/// Arena of tasks keyed by id, with a parent → children index.
///
/// Parent links are plain ids; children are looked up through the index, so
/// the structure never holds references in both directions. Change a task's
/// parent through [`TaskTree::set_parent`] (or the operations in
/// [`crate::ops::hierarchy`]) so the index stays in sync.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    tasks: BTreeMap<TaskId, Task>,
    children: BTreeMap<TaskId, BTreeSet<TaskId>>,
    next_id: u64,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from already-persisted tasks, keeping their ids.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut tree = TaskTree::new();
        for task in tasks {
            tree.next_id = tree.next_id.max(task.id.0);
            if let Some(parent) = task.parent_id {
                tree.children.entry(parent).or_default().insert(task.id);
            }
            tree.tasks.insert(task.id, task);
        }
        tree
    }

    /// Check that every parent link points at a task in the tree and that no
    /// task is its own ancestor.
    pub fn validate(&self) -> Result<(), TaskError> {
        for task in self.tasks.values() {
            if let Some(parent) = task.parent_id
                && !self.tasks.contains_key(&parent)
            {
                return Err(TaskError::MissingParent {
                    task: task.id,
                    parent,
                });
            }
            if self.ancestors(task.id).contains(&task.id) {
                return Err(TaskError::ParentLoop(task.id));
            }
        }
        Ok(())
    }

    /// Insert a task under a freshly allocated id and return that id.
    pub fn insert(&mut self, mut task: Task) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        task.id = id;
        task.mark_dirty();
        if let Some(parent) = task.parent_id {
            self.children.entry(parent).or_default().insert(id);
        }
        self.tasks.insert(id, task);
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Lookup that reports a missing id as [`TaskError::NotFound`].
    pub fn task(&self, id: TaskId) -> Result<&Task, TaskError> {
        self.tasks.get(&id).ok_or(TaskError::NotFound(id))
    }

    pub fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, TaskError> {
        self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn parent(&self, id: TaskId) -> Option<&Task> {
        self.get(id)
            .and_then(|t| t.parent_id)
            .and_then(|p| self.get(p))
    }

    /// Direct children of `id`, in id order.
    pub fn children(&self, id: TaskId) -> Vec<TaskId> {
        self.children
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Tasks without a parent, in id order.
    pub fn roots(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.parent_id.is_none())
            .map(|t| t.id)
            .collect()
    }

    /// Parent chain of `id`, nearest first. Stops at a missing parent or a
    /// repeated id.
    pub fn ancestors(&self, id: TaskId) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).and_then(|t| t.parent_id);
        while let Some(pid) = current {
            if chain.len() >= self.tasks.len() || chain.contains(&pid) {
                break;
            }
            chain.push(pid);
            current = self.get(pid).and_then(|t| t.parent_id);
        }
        chain
    }

    /// True when `id` is `ancestor` itself or lies somewhere below it.
    pub fn is_within(&self, id: TaskId, ancestor: TaskId) -> bool {
        id == ancestor || self.ancestors(id).contains(&ancestor)
    }

    /// Re-point a task's parent and keep the children index in sync.
    pub fn set_parent(&mut self, id: TaskId, parent: Option<TaskId>) -> Result<(), TaskError> {
        let task = self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))?;
        let old = task.parent_id;
        if old == parent {
            return Ok(());
        }
        task.parent_id = parent;
        task.mark_dirty();

        if let Some(old) = old
            && let Some(set) = self.children.get_mut(&old)
        {
            set.remove(&id);
            if set.is_empty() {
                self.children.remove(&old);
            }
        }
        if let Some(new) = parent {
            self.children.entry(new).or_default().insert(id);
        }
        Ok(())
    }

    /// Ids of tasks changed since the last [`TaskTree::clear_dirty`].
    pub fn dirty_ids(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.dirty)
            .map(|t| t.id)
            .collect()
    }

    pub fn clear_dirty(&mut self) {
        for task in self.tasks.values_mut() {
            task.dirty = false;
        }
    }
}

impl PartialEq for TaskTree {
    fn eq(&self, other: &Self) -> bool {
        self.tasks == other.tasks && self.children == other.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskType;

    fn sample_tree() -> (TaskTree, TaskId, TaskId, TaskId) {
        let mut tree = TaskTree::new();
        let project = tree.insert(Task::new("Move house").with_type(TaskType::Project));
        let mut a = Task::new("Book van");
        a.parent_id = Some(project);
        let a = tree.insert(a);
        let mut b = Task::new("Pack kitchen");
        b.parent_id = Some(project);
        let b = tree.insert(b);
        (tree, project, a, b)
    }

    #[test]
    fn test_insert_allocates_ids_and_indexes_children() {
        let (tree, project, a, b) = sample_tree();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(project), vec![a, b]);
        assert_eq!(tree.roots(), vec![project]);
        assert_eq!(tree.parent(a).map(|t| t.id), Some(project));
    }

    #[test]
    fn test_set_parent_updates_index() {
        let (mut tree, project, a, b) = sample_tree();
        tree.set_parent(a, None).unwrap();
        assert_eq!(tree.children(project), vec![b]);
        assert_eq!(tree.roots(), vec![project, a]);

        tree.set_parent(b, None).unwrap();
        assert!(tree.children(project).is_empty());
    }

    #[test]
    fn test_set_parent_missing_task() {
        let (mut tree, ..) = sample_tree();
        let err = tree.set_parent(TaskId(99), None).unwrap_err();
        assert_eq!(err, TaskError::NotFound(TaskId(99)));
    }

    #[test]
    fn test_ancestors_and_is_within() {
        let (mut tree, project, a, _) = sample_tree();
        let mut deep = Task::new("Find tape");
        deep.parent_id = Some(a);
        let deep = tree.insert(deep);
        assert_eq!(tree.ancestors(deep), vec![a, project]);
        assert!(tree.is_within(deep, project));
        assert!(tree.is_within(project, project));
        assert!(!tree.is_within(project, deep));
    }

    #[test]
    fn test_from_tasks_keeps_ids() {
        let mut p = Task::new("p").with_type(TaskType::Project);
        p.id = TaskId(10);
        let mut c = Task::new("c");
        c.id = TaskId(12);
        c.parent_id = Some(TaskId(10));
        let mut tree = TaskTree::from_tasks([p, c]);
        assert_eq!(tree.children(TaskId(10)), vec![TaskId(12)]);
        let next = tree.insert(Task::new("n"));
        assert_eq!(next, TaskId(13));
    }

    fn linked(id: u64, parent: Option<u64>) -> Task {
        let mut task = Task::new("t").with_type(TaskType::Project);
        task.id = TaskId(id);
        task.parent_id = parent.map(TaskId);
        task
    }

    #[test]
    fn test_validate_accepts_well_formed_tree() {
        let (tree, ..) = sample_tree();
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_parent_loop() {
        let tree = TaskTree::from_tasks([linked(1, Some(2)), linked(2, Some(1))]);
        assert_eq!(tree.validate(), Err(TaskError::ParentLoop(TaskId(1))));
        assert_eq!(tree.ancestors(TaskId(1)), vec![TaskId(2), TaskId(1)]);

        let tree = TaskTree::from_tasks([linked(5, Some(5))]);
        assert_eq!(tree.validate(), Err(TaskError::ParentLoop(TaskId(5))));
    }

    #[test]
    fn test_validate_rejects_missing_parent() {
        let tree = TaskTree::from_tasks([linked(1, None), linked(2, Some(9))]);
        assert_eq!(
            tree.validate(),
            Err(TaskError::MissingParent {
                task: TaskId(2),
                parent: TaskId(9)
            })
        );
    }

    #[test]
    fn test_dirty_tracking() {
        let (mut tree, _, a, _) = sample_tree();
        assert_eq!(tree.dirty_ids().len(), 3);
        tree.clear_dirty();
        assert!(tree.dirty_ids().is_empty());
        tree.set_parent(a, None).unwrap();
        assert_eq!(tree.dirty_ids(), vec![a]);
    }
}
