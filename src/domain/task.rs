use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in the task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable identifier, generated locally at creation
    pub id: Uuid,
    /// Display text (stored trimmed, never empty)
    pub title: String,
    /// Completed tasks leave the active ordering
    pub is_completed: bool,
    /// Position among active tasks (ignored while completed)
    pub sort_order: usize,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation; completed tasks are ordered by it
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: String, sort_order: usize, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            is_completed: false,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    /// Field-level difference from `earlier`, used to build sync updates
    pub fn diff(&self, earlier: &Task) -> TaskPatch {
        TaskPatch {
            title: (self.title != earlier.title).then(|| self.title.clone()),
            is_completed: (self.is_completed != earlier.is_completed).then_some(self.is_completed),
            sort_order: (self.sort_order != earlier.sort_order).then_some(self.sort_order),
            updated_at: (self.updated_at != earlier.updated_at).then_some(self.updated_at),
        }
    }

    /// Apply a field-level patch in place
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(is_completed) = patch.is_completed {
            self.is_completed = is_completed;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Subset of task fields changed by one mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.is_completed.is_none()
            && self.sort_order.is_none()
            && self.updated_at.is_none()
    }
}

/// Normalize user-entered title text; `None` means nothing worth storing
pub fn clean_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
