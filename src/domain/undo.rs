use super::task::Task;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Inverse record for one mutating store operation.
///
/// Each variant keeps a copy of whatever the mutation overwrote, so undo
/// never depends on the live task surviving unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoAction {
    /// A task was created; undo removes it
    AddTask { task: Task },
    /// A task was removed from `index` of its partition; undo reinserts it
    DeleteTask { task: Task, index: usize },
    /// Completion flag flipped; undo restores the flag and the old position
    ToggleComplete {
        id: Uuid,
        previous: bool,
        previous_sort_order: usize,
        previous_updated_at: DateTime<Utc>,
    },
    /// Title changed; undo restores the previous text
    UpdateTitle {
        id: Uuid,
        previous_title: String,
        new_title: String,
        previous_updated_at: DateTime<Utc>,
    },
}

impl UndoAction {
    pub fn task_id(&self) -> Uuid {
        match self {
            UndoAction::AddTask { task } | UndoAction::DeleteTask { task, .. } => task.id,
            UndoAction::ToggleComplete { id, .. } | UndoAction::UpdateTitle { id, .. } => *id,
        }
    }

    /// Short label for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            UndoAction::AddTask { .. } => "add",
            UndoAction::DeleteTask { .. } => "delete",
            UndoAction::ToggleComplete { .. } => "toggle",
            UndoAction::UpdateTitle { .. } => "rename",
        }
    }
}

/// LIFO stack of undo records, optionally capped
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    entries: Vec<UndoAction>,
    capacity: Option<usize>,
}

impl UndoLog {
    /// Keep at most `capacity` entries, dropping the oldest first
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn push(&mut self, action: UndoAction) {
        if self.capacity == Some(0) {
            return;
        }
        self.entries.push(action);
        if let Some(cap) = self.capacity {
            if self.entries.len() > cap {
                let excess = self.entries.len() - cap;
                self.entries.drain(..excess);
            }
        }
    }

    pub fn pop(&mut self) -> Option<UndoAction> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn peek(&self) -> Option<&UndoAction> {
        self.entries.last()
    }
}
