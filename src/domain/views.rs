use super::task::Task;
use std::cmp::Ordering;
use uuid::Uuid;

/// The two partitions rendered by the UI
#[derive(Debug, Clone, Default)]
pub struct TaskViews<'a> {
    /// Incomplete tasks, ascending by sort order
    pub active: Vec<&'a Task>,
    /// Completed tasks, most recently updated first
    pub completed: Vec<&'a Task>,
}

impl<'a> TaskViews<'a> {
    pub fn active_ids(&self) -> Vec<Uuid> {
        self.active.iter().map(|t| t.id).collect()
    }

    /// Active rows followed by completed rows
    pub fn rows(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.active.iter().chain(self.completed.iter()).copied()
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split a snapshot into active and completed partitions
pub fn derive_views(tasks: &[Task]) -> TaskViews<'_> {
    let (mut active, mut completed): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|t| t.is_active());

    active.sort_by(|a, b| active_order(a, b));
    completed.sort_by(|a, b| completed_order(a, b));

    TaskViews { active, completed }
}

/// Ties only happen with stale remote data; fall back to creation order
pub fn active_order(a: &Task, b: &Task) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}

pub fn completed_order(a: &Task, b: &Task) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then(b.created_at.cmp(&a.created_at))
        .then(a.id.cmp(&b.id))
}
