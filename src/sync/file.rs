use super::account::{load_account, User};
use super::{SyncAdapter, SyncError};
use crate::domain::{apply_mutations, Mutation, Task};
use crate::persistence::{atomic_write, tasks_file};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// On-disk layout of a task file
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Sync backend storing one JSON file per account in the data directory.
///
/// Several sessions may share a directory; writes made by another session are
/// noticed through the file's modification time and merged before our own
/// writes are applied, last write wins per field.
pub struct FileSync {
    dir: PathBuf,
    user: Option<User>,
    records: Vec<Task>,
    last_seen: Option<SystemTime>,
    remote_pending: bool,
}

impl FileSync {
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        let user = load_account(&dir)?;
        Ok(Self {
            dir,
            user,
            records: Vec::new(),
            last_seen: None,
            remote_pending: false,
        })
    }

    fn path(&self) -> Result<PathBuf, SyncError> {
        let user = self.user.as_ref().ok_or(SyncError::NotSignedIn)?;
        Ok(tasks_file(&self.dir, user.id))
    }

    fn write(&mut self, mutations: &[Mutation]) -> Result<(), SyncError> {
        let path = self.path()?;

        if modified(&path) != self.last_seen {
            debug!("task file changed on disk, merging before write");
            self.records = read_records(&path)?;
            self.remote_pending = true;
        }

        let applied = apply_mutations(&mut self.records, mutations);
        let json = serde_json::to_string_pretty(&TaskFile {
            tasks: self.records.clone(),
        })?;
        atomic_write(&path, &json).map_err(|e| SyncError::Unavailable(format!("{:#}", e)))?;
        self.last_seen = modified(&path);

        debug!(submitted = mutations.len(), applied, "task file written");
        Ok(())
    }
}

impl SyncAdapter for FileSync {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }

    fn query(&mut self) -> Result<Vec<Task>, SyncError> {
        let path = self.path()?;
        self.records = read_records(&path)?;
        self.last_seen = modified(&path);
        self.remote_pending = false;
        Ok(self.records.clone())
    }

    fn transact(&mut self, mutations: Vec<Mutation>) {
        if mutations.is_empty() {
            return;
        }
        if let Err(err) = self.write(&mutations) {
            warn!(error = %err, count = mutations.len(), "failed to persist task changes");
        }
    }

    fn poll_remote(&mut self) -> Option<Vec<Task>> {
        let path = self.path().ok()?;
        let current = modified(&path);

        if current != self.last_seen {
            match read_records(&path) {
                Ok(records) => {
                    self.records = records;
                    self.remote_pending = true;
                }
                Err(err) => warn!(error = %err, "ignoring unreadable task file"),
            }
            self.last_seen = current;
        }

        if !self.remote_pending {
            return None;
        }
        self.remote_pending = false;
        info!(count = self.records.len(), "picked up tasks written by another session");
        Some(self.records.clone())
    }
}

fn read_records(path: &Path) -> Result<Vec<Task>, SyncError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: TaskFile = serde_json::from_str(&content)?;
    Ok(file.tasks)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskPatch;
    use crate::sync::sign_in;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::tempdir;

    fn signed_in_sync(dir: &Path) -> FileSync {
        sign_in(dir, "sam@example.com").unwrap();
        FileSync::open(dir).unwrap()
    }

    fn bump_mtime(path: &Path) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
    }

    #[test]
    fn test_query_requires_account() {
        let temp_dir = tempdir().unwrap();
        let mut sync = FileSync::open(temp_dir.path()).unwrap();

        assert!(sync.current_user().is_none());
        assert!(matches!(sync.query(), Err(SyncError::NotSignedIn)));
    }

    #[test]
    fn test_fresh_account_has_no_tasks() {
        let temp_dir = tempdir().unwrap();
        let mut sync = signed_in_sync(temp_dir.path());

        assert_eq!(sync.current_user().unwrap().email, "sam@example.com");
        assert!(sync.query().unwrap().is_empty());
    }

    #[test]
    fn test_transact_persists_across_sessions() {
        let temp_dir = tempdir().unwrap();
        let mut sync = signed_in_sync(temp_dir.path());
        sync.query().unwrap();

        let task = Task::new("Buy milk".to_string(), 0, Utc::now());
        let id = task.id;
        sync.transact(vec![
            Mutation::Create { task },
            Mutation::Update {
                id,
                patch: TaskPatch {
                    title: Some("Buy oat milk".to_string()),
                    ..TaskPatch::default()
                },
            },
        ]);

        let mut reopened = FileSync::open(temp_dir.path()).unwrap();
        let tasks = reopened.query().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy oat milk");
    }

    #[test]
    fn test_own_writes_are_not_reported_as_remote() {
        let temp_dir = tempdir().unwrap();
        let mut sync = signed_in_sync(temp_dir.path());
        sync.query().unwrap();

        sync.transact(vec![Mutation::Create {
            task: Task::new("Mine".to_string(), 0, Utc::now()),
        }]);

        assert!(sync.poll_remote().is_none());
    }

    #[test]
    fn test_poll_remote_sees_other_session() {
        let temp_dir = tempdir().unwrap();
        let mut ours = signed_in_sync(temp_dir.path());
        ours.query().unwrap();

        let mut theirs = FileSync::open(temp_dir.path()).unwrap();
        theirs.query().unwrap();
        theirs.transact(vec![Mutation::Create {
            task: Task::new("From laptop".to_string(), 0, Utc::now()),
        }]);
        bump_mtime(&ours.path().unwrap());

        let snapshot = ours.poll_remote().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].title, "From laptop");
        assert!(ours.poll_remote().is_none());
    }

    #[test]
    fn test_write_merges_remote_changes_first() {
        let temp_dir = tempdir().unwrap();
        let mut ours = signed_in_sync(temp_dir.path());
        ours.query().unwrap();

        let mut theirs = FileSync::open(temp_dir.path()).unwrap();
        theirs.query().unwrap();
        theirs.transact(vec![Mutation::Create {
            task: Task::new("Theirs".to_string(), 0, Utc::now()),
        }]);
        bump_mtime(&ours.path().unwrap());

        ours.transact(vec![Mutation::Create {
            task: Task::new("Ours".to_string(), 1, Utc::now()),
        }]);

        let merged = ours.poll_remote().unwrap();
        let mut titles: Vec<String> = merged.into_iter().map(|t| t.title).collect();
        titles.sort();
        assert_eq!(titles, vec!["Ours", "Theirs"]);
    }

    #[test]
    fn test_corrupt_file_fails_query() {
        let temp_dir = tempdir().unwrap();
        let mut sync = signed_in_sync(temp_dir.path());
        let path = sync.path().unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ definitely not tasks").unwrap();

        assert!(matches!(sync.query(), Err(SyncError::Json(_))));
    }
}
