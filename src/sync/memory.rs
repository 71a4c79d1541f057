use super::account::User;
use super::{SyncAdapter, SyncError};
use crate::domain::{apply_mutations, Mutation, Task};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryState {
    user: Option<User>,
    records: Vec<Task>,
    transactions: Vec<Vec<Mutation>>,
    query_error: Option<String>,
    remote: Option<Vec<Task>>,
}

/// In-process backend for throwaway sessions. Clones share state, so a
/// caller can keep a handle after giving one to the application.
#[derive(Debug, Clone, Default)]
pub struct MemorySync {
    inner: Rc<RefCell<MemoryState>>,
}

impl MemorySync {
    pub fn signed_in(user: User) -> Self {
        let sync = Self::default();
        sync.inner.borrow_mut().user = Some(user);
        sync
    }

    #[cfg(test)]
    pub fn signed_out() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        self.inner.borrow_mut().records = tasks;
        self
    }

    /// Make every following query fail with `message`
    #[cfg(test)]
    pub fn fail_queries(&self, message: &str) {
        self.inner.borrow_mut().query_error = Some(message.to_string());
    }

    /// Simulate another session replacing the collection
    #[cfg(test)]
    pub fn push_remote(&self, tasks: Vec<Task>) {
        let mut state = self.inner.borrow_mut();
        state.records = tasks.clone();
        state.remote = Some(tasks);
    }

    #[cfg(test)]
    pub fn records(&self) -> Vec<Task> {
        self.inner.borrow().records.clone()
    }

    #[cfg(test)]
    pub fn transactions(&self) -> Vec<Vec<Mutation>> {
        self.inner.borrow().transactions.clone()
    }
}

impl SyncAdapter for MemorySync {
    fn current_user(&self) -> Option<User> {
        self.inner.borrow().user.clone()
    }

    fn query(&mut self) -> Result<Vec<Task>, SyncError> {
        let state = self.inner.borrow();
        if state.user.is_none() {
            return Err(SyncError::NotSignedIn);
        }
        if let Some(message) = &state.query_error {
            return Err(SyncError::Unavailable(message.clone()));
        }
        Ok(state.records.clone())
    }

    fn transact(&mut self, mutations: Vec<Mutation>) {
        if mutations.is_empty() {
            return;
        }
        let mut state = self.inner.borrow_mut();
        apply_mutations(&mut state.records, &mutations);
        state.transactions.push(mutations);
    }

    fn poll_remote(&mut self) -> Option<Vec<Task>> {
        self.inner.borrow_mut().remote.take()
    }
}
