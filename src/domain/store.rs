use super::clock::{Clock, SystemClock};
use super::mutation::Mutation;
use super::task::{clean_title, Task};
use super::undo::{UndoAction, UndoLog};
use super::views::{derive_views, TaskViews};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Authoritative task collection plus its undo log.
///
/// Every mutating call updates the tasks, the undo log and the sync outbox
/// together before returning. Calls naming an unknown id are silent no-ops.
pub struct TaskStore {
    tasks: Vec<Task>,
    undo: UndoLog,
    clock: Box<dyn Clock>,
    outbox: Vec<Mutation>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>, undo_limit: Option<usize>) -> Self {
        Self::with_clock(tasks, Box::new(SystemClock), undo_limit)
    }

    /// Loaded tasks with gaps in their active sort orders are renumbered,
    /// queueing the fixes in the outbox
    pub fn with_clock(tasks: Vec<Task>, clock: Box<dyn Clock>, undo_limit: Option<usize>) -> Self {
        let mut store = Self {
            tasks: dedupe(tasks),
            undo: UndoLog::with_capacity(undo_limit),
            clock,
            outbox: Vec::new(),
        };
        store.settle_active();
        store
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn views(&self) -> TaskViews<'_> {
        derive_views(&self.tasks)
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Drain writes produced since the last call
    pub fn take_outbox(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.outbox)
    }

    /// Create a task at the end of the active list
    pub fn add(&mut self, title: &str) -> Option<Uuid> {
        let Some(title) = clean_title(title) else {
            debug!("ignoring add with empty title");
            return None;
        };

        let now = self.clock.now();
        let task = Task::new(title, self.active_count(), now);
        let id = task.id;

        self.tasks.push(task.clone());
        self.outbox.push(Mutation::Create { task: task.clone() });
        self.undo.push(UndoAction::AddTask { task });
        debug!(%id, "task added");
        Some(id)
    }

    /// Flip completion; the task leaves or rejoins (at the end) the active list
    pub fn toggle_complete(&mut self, id: Uuid) {
        let Some(pos) = self.position(id) else {
            debug!(%id, "toggle for unknown task");
            return;
        };

        let now = self.clock.now();
        let active_count = self.active_count();
        let before = self.tasks[pos].clone();

        let task = &mut self.tasks[pos];
        task.is_completed = !task.is_completed;
        task.updated_at = now;
        if task.is_active() {
            task.sort_order = active_count;
        }
        let patch = task.diff(&before);

        self.outbox.push(Mutation::Update { id, patch });
        self.settle_active();
        self.undo.push(UndoAction::ToggleComplete {
            id,
            previous: before.is_completed,
            previous_sort_order: before.sort_order,
            previous_updated_at: before.updated_at,
        });
        debug!(%id, completed = !before.is_completed, "task toggled");
    }

    /// Remove a task, remembering where it sat in its partition
    pub fn delete(&mut self, id: Uuid) {
        let Some(index) = self.partition_index(id) else {
            debug!(%id, "delete for unknown task");
            return;
        };
        let Some(pos) = self.position(id) else {
            return;
        };

        let task = self.tasks.remove(pos);
        self.outbox.push(Mutation::Delete { id });
        if task.is_active() {
            self.settle_active();
        }
        self.undo.push(UndoAction::DeleteTask { task, index });
        debug!(%id, index, "task deleted");
    }

    /// Change the title; an empty title deletes the task instead
    pub fn rename(&mut self, id: Uuid, new_title: &str) {
        let Some(pos) = self.position(id) else {
            debug!(%id, "rename for unknown task");
            return;
        };
        let Some(title) = clean_title(new_title) else {
            self.delete(id);
            return;
        };
        if self.tasks[pos].title == title {
            return;
        }

        let now = self.clock.now();
        let before = self.tasks[pos].clone();
        let task = &mut self.tasks[pos];
        task.title = title.clone();
        task.updated_at = now;
        let patch = task.diff(&before);

        self.outbox.push(Mutation::Update { id, patch });
        self.undo.push(UndoAction::UpdateTitle {
            id,
            previous_title: before.title,
            new_title: title,
            previous_updated_at: before.updated_at,
        });
        debug!(%id, "task renamed");
    }

    /// Reassign active sort orders to match `order`.
    ///
    /// `order` must be a permutation of the active ids. Not undo-logged.
    pub fn reorder(&mut self, order: &[Uuid]) {
        let current = self.active_ids();
        if !is_permutation(order, &current) {
            warn!(
                submitted = order.len(),
                active = current.len(),
                "reorder is not a permutation of the active tasks"
            );
            return;
        }

        let now = self.clock.now();
        let changed = self.renumber(order, Some(now));
        debug!(changed, "active tasks reordered");
    }

    /// Revert the most recent logged mutation. Returns false on an empty log.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo.pop() else {
            return false;
        };
        debug!(kind = action.kind(), id = %action.task_id(), "undo");
        self.apply_inverse(action);
        true
    }

    /// Swap in a full remote snapshot. Gaps in the active sort orders are
    /// closed right away, so later undo entries see contiguous orders.
    pub fn replace_all(&mut self, snapshot: Vec<Task>) {
        self.tasks = dedupe(snapshot);
        let order = self.active_ids();
        let settled = self.renumber(&order, None);
        info!(count = self.tasks.len(), settled, "task snapshot replaced");
    }

    fn apply_inverse(&mut self, action: UndoAction) {
        match action {
            UndoAction::AddTask { task } => self.remove_added(task.id),
            UndoAction::DeleteTask { task, index } => self.reinsert(task, index),
            UndoAction::ToggleComplete {
                id,
                previous,
                previous_sort_order,
                previous_updated_at,
            } => self.restore_completion(id, previous, previous_sort_order, previous_updated_at),
            UndoAction::UpdateTitle {
                id,
                previous_title,
                new_title,
                previous_updated_at,
            } => self.restore_title(id, previous_title, &new_title, previous_updated_at),
        }
    }

    fn remove_added(&mut self, id: Uuid) {
        let Some(pos) = self.position(id) else {
            return;
        };
        let task = self.tasks.remove(pos);
        self.outbox.push(Mutation::Delete { id });
        if task.is_active() {
            self.settle_active();
        }
    }

    fn reinsert(&mut self, task: Task, index: usize) {
        if self.contains(task.id) {
            debug!(id = %task.id, "deleted task already present again");
            return;
        }

        let id = task.id;
        let active = task.is_active();
        let mut order = self.active_ids();

        self.tasks.push(task.clone());
        self.outbox.push(Mutation::Create { task });

        // Completed tasks regain their slot through the restored updated_at
        if active {
            order.insert(index.min(order.len()), id);
            self.renumber(&order, None);
        }
    }

    fn restore_completion(
        &mut self,
        id: Uuid,
        previous: bool,
        previous_sort_order: usize,
        previous_updated_at: DateTime<Utc>,
    ) {
        let Some(pos) = self.position(id) else {
            return;
        };

        let mut order: Vec<Uuid> = self.active_ids().into_iter().filter(|x| *x != id).collect();
        let before = self.tasks[pos].clone();

        let task = &mut self.tasks[pos];
        task.is_completed = previous;
        task.sort_order = previous_sort_order;
        task.updated_at = previous_updated_at;
        let patch = task.diff(&before);
        if !patch.is_empty() {
            self.outbox.push(Mutation::Update { id, patch });
        }

        if !previous {
            order.insert(previous_sort_order.min(order.len()), id);
        }
        self.renumber(&order, None);
    }

    fn restore_title(
        &mut self,
        id: Uuid,
        previous_title: String,
        new_title: &str,
        previous_updated_at: DateTime<Utc>,
    ) {
        let Some(pos) = self.position(id) else {
            return;
        };
        if self.tasks[pos].title != new_title {
            debug!(%id, "title changed remotely since rename; restoring anyway");
        }

        let before = self.tasks[pos].clone();
        let task = &mut self.tasks[pos];
        task.title = previous_title;
        task.updated_at = previous_updated_at;
        let patch = task.diff(&before);
        if !patch.is_empty() {
            self.outbox.push(Mutation::Update { id, patch });
        }
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_active()).count()
    }

    fn active_ids(&self) -> Vec<Uuid> {
        self.views().active_ids()
    }

    /// Index of the task within whichever partition it belongs to
    fn partition_index(&self, id: Uuid) -> Option<usize> {
        let views = self.views();
        let task = self.get(id)?;
        let partition = if task.is_active() {
            &views.active
        } else {
            &views.completed
        };
        partition.iter().position(|t| t.id == id)
    }

    /// Close gaps left in the active ordering
    fn settle_active(&mut self) {
        let order = self.active_ids();
        self.renumber(&order, None);
    }

    /// Give each id in `order` its position as sort order, queueing an update
    /// for every task that moved. `touched_at` also refreshes `updated_at`.
    fn renumber(&mut self, order: &[Uuid], touched_at: Option<DateTime<Utc>>) -> usize {
        let positions: HashMap<Uuid, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut changed = 0;
        for task in self.tasks.iter_mut() {
            let Some(&slot) = positions.get(&task.id) else {
                continue;
            };
            if task.sort_order == slot {
                continue;
            }
            let before = task.clone();
            task.sort_order = slot;
            if let Some(at) = touched_at {
                task.updated_at = at;
            }
            self.outbox.push(Mutation::Update {
                id: task.id,
                patch: task.diff(&before),
            });
            changed += 1;
        }
        changed
    }
}

fn is_permutation(order: &[Uuid], current: &[Uuid]) -> bool {
    if order.len() != current.len() {
        return false;
    }
    let submitted: HashSet<&Uuid> = order.iter().collect();
    submitted.len() == order.len() && current.iter().all(|id| submitted.contains(id))
}

/// Collapse repeated ids, keeping the most recently updated record
fn dedupe(tasks: Vec<Task>) -> Vec<Task> {
    let mut out: Vec<Task> = Vec::with_capacity(tasks.len());
    let mut seen: HashMap<Uuid, usize> = HashMap::new();

    for task in tasks {
        match seen.get(&task.id) {
            Some(&i) => {
                if task.updated_at > out[i].updated_at {
                    out[i] = task;
                }
            }
            None => {
                seen.insert(task.id, out.len());
                out.push(task);
            }
        }
    }
    out
}
