//! Boundary to the backend that stores tasks and propagates them between
//! sessions. The task store never waits on it: local state is updated first
//! and the resulting mutations are handed over fire-and-forget.

pub mod account;
pub mod file;
pub mod memory;

use crate::domain::{Mutation, Task};
use thiserror::Error;

pub use account::{sign_in, sign_out, User};
pub use file::FileSync;
pub use memory::MemorySync;

/// Failures surfaced by a sync backend
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed task data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sync unavailable: {0}")]
    Unavailable(String),
}

/// Capabilities the application consumes from a sync backend
pub trait SyncAdapter {
    /// Identity gate; `None` means nothing else may be called yet
    fn current_user(&self) -> Option<User>;

    /// Full task collection for the signed-in account
    fn query(&mut self) -> Result<Vec<Task>, SyncError>;

    /// Persist an ordered batch of writes. Failures are logged, not returned.
    fn transact(&mut self, mutations: Vec<Mutation>);

    /// A newer snapshot written by another session, if one arrived
    fn poll_remote(&mut self) -> Option<Vec<Task>> {
        None
    }
}
