use super::task::{Task, TaskPatch};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// One field-level write handed to the sync backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert a full record (replaces any record with the same id)
    Create { task: Task },
    /// Patch fields of an existing record
    Update { id: Uuid, patch: TaskPatch },
    Delete { id: Uuid },
}

impl Mutation {
    pub fn task_id(&self) -> Uuid {
        match self {
            Mutation::Create { task } => task.id,
            Mutation::Update { id, .. } | Mutation::Delete { id } => *id,
        }
    }
}

/// Replay mutations against a record set, returns how many took effect.
/// Updates and deletes for unknown ids are skipped.
pub fn apply_mutations(records: &mut Vec<Task>, mutations: &[Mutation]) -> usize {
    let mut applied = 0;
    for mutation in mutations {
        let took_effect = match mutation {
            Mutation::Create { task } => {
                match records.iter_mut().find(|t| t.id == task.id) {
                    Some(existing) => *existing = task.clone(),
                    None => records.push(task.clone()),
                }
                true
            }
            Mutation::Update { id, patch } => match records.iter_mut().find(|t| t.id == *id) {
                Some(existing) => {
                    existing.apply(patch);
                    true
                }
                None => false,
            },
            Mutation::Delete { id } => {
                let before = records.len();
                records.retain(|t| t.id != *id);
                records.len() != before
            }
        };

        if took_effect {
            applied += 1;
        } else {
            debug!(id = %mutation.task_id(), "skipping write for unknown task");
        }
    }
    applied
}
