//! Persistence of the task list to a local key-value store.
//!
//! The whole collection lives under a single fixed key. Storage is best
//! effort: `TaskStore` never hands an error back to its caller. Read failures
//! behave like an empty store and write failures are dropped, both after being
//! logged.

#[cfg(test)]
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use thiserror::Error;

use crate::task::Task;

/// Key under which the serialized task collection is stored.
pub const STORAGE_KEY: &str = "task-list";

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("stored tasks are not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Directory-backed store: each key is a `<key>.json` file under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let written = File::create(&tmp).and_then(|mut f| {
            f.write_all(value.as_bytes())?;
            f.flush()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests. Reads or writes can be made to fail to mimic
/// an unavailable store or a full quota.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        MemoryStore {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_reads() -> Self {
        MemoryStore {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("store is locked".into()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("quota exceeded".into()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("store is read-only".into()));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads and writes the task collection under [`STORAGE_KEY`].
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(backend: S) -> Self {
        TaskStore { backend }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Load the stored tasks. Missing or unreadable data yields an empty list.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load tasks, starting with an empty list");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<Task>, StorageError> {
        match self.backend.get(STORAGE_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist the full collection. Failures are logged and dropped.
    pub fn save(&mut self, tasks: &[Task]) {
        match self.try_save(tasks) {
            Ok(()) => tracing::debug!(count = tasks.len(), "saved tasks"),
            Err(e) => tracing::error!(error = %e, "failed to save tasks"),
        }
    }

    fn try_save(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        let data = serde_json::to_string(tasks)?;
        self.backend.set(STORAGE_KEY, &data)
    }

    /// Remove the stored entry entirely. Failures are logged and dropped.
    pub fn clear(&mut self) {
        if let Err(e) = self.backend.remove(STORAGE_KEY) {
            tracing::error!(error = %e, "failed to clear stored tasks");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Priority;
    use crate::list::tests::task;
    use crate::list::TaskList;
    use proptest::prelude::*;

    fn sample() -> Vec<Task> {
        vec![
            task("b", "Second thing", false, 2, Priority::High),
            task("a", "First thing", true, 1, Priority::Low),
        ]
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = TaskStore::new(MemoryStore::new());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut store = TaskStore::new(MemoryStore::new());
        store.save(&sample());
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn test_round_trip_of_freshly_added_tasks() {
        let list = TaskList::default()
            .add("Water the plants", Priority::Low)
            .unwrap()
            .add("Pay the rent", Priority::High)
            .unwrap();
        let mut store = TaskStore::new(MemoryStore::new());
        store.save(list.tasks());
        assert_eq!(TaskList::new(store.load()), list);
    }

    #[test]
    fn test_malformed_json_is_empty() {
        let store = TaskStore::new(MemoryStore::with_entry(STORAGE_KEY, "{not json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_shape_mismatch_discards_everything() {
        let raw = r#"[
            {"id":"a","text":"Fine task","completed":false,"createdAt":"2024-01-01T00:00:00.000Z","priority":"low"},
            {"id":"b","text":"Bad priority","completed":false,"createdAt":"2024-01-01T00:00:00.000Z","priority":"urgent"}
        ]"#;
        let store = TaskStore::new(MemoryStore::with_entry(STORAGE_KEY, raw));
        assert!(store.load().is_empty());

        let not_array = TaskStore::new(MemoryStore::with_entry(STORAGE_KEY, r#"{"tasks":[]}"#));
        assert!(not_array.load().is_empty());

        let bad_date = r#"[{"id":"a","text":"abc","completed":false,"createdAt":"yesterday","priority":"low"}]"#;
        let store = TaskStore::new(MemoryStore::with_entry(STORAGE_KEY, bad_date));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_failed_save_is_swallowed() {
        let mut store = TaskStore::new(MemoryStore::failing_writes());
        store.save(&sample());
        store.clear();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_clear_removes_entry() {
        let mut store = TaskStore::new(MemoryStore::new());
        store.save(&sample());
        store.clear();
        assert!(store.backend().get(STORAGE_KEY).unwrap().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");
        let mut store = TaskStore::new(FileStore::new(&root));
        assert!(store.load().is_empty());
        store.save(&sample());
        assert!(root.join("task-list.json").exists());
        assert!(!root.join("task-list.json.tmp").exists());

        let reopened = TaskStore::new(FileStore::new(&root));
        assert_eq!(reopened.load(), sample());
    }

    #[test]
    fn test_file_store_clear_twice() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TaskStore::new(FileStore::new(dir.path()));
        store.save(&sample());
        store.clear();
        store.clear();
        assert!(store.load().is_empty());
        assert!(!dir.path().join("task-list.json").exists());
    }

    #[test]
    fn test_file_store_garbage_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("task-list.json"), "garbage").unwrap();
        let store = TaskStore::new(FileStore::new(dir.path()));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_unreadable_store_is_empty() {
        let store = TaskStore::new(MemoryStore::failing_reads());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_store_read_error_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("task-list.json")).unwrap();
        let store = TaskStore::new(FileStore::new(dir.path()));
        assert!(matches!(store.backend().get(STORAGE_KEY), Err(StorageError::Io(_))));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_file_store_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the target makes the rename fail.
        fs::create_dir(dir.path().join("task-list.json")).unwrap();
        fs::write(dir.path().join("task-list.json").join("keep"), "x").unwrap();
        let mut backend = FileStore::new(dir.path());
        assert!(backend.set(STORAGE_KEY, "[]").is_err());
        assert!(!dir.path().join("task-list.json.tmp").exists());
    }

    #[test]
    fn test_resaving_loaded_tasks_keeps_timestamps() {
        let raw = r#"[{"id":"a","text":"Precise task","completed":false,"createdAt":"2024-01-01T00:00:00.123456Z","priority":"high"}]"#;
        let mut store = TaskStore::new(MemoryStore::with_entry(STORAGE_KEY, raw));
        let first = store.load();
        assert_eq!(first.len(), 1);
        store.save(&first);
        assert_eq!(store.load(), first);
    }

    proptest! {
        #[test]
        fn prop_save_then_load_is_identity(
            rows in prop::collection::vec(("[a-z ]{3,40}", any::<bool>(), 0i64..1_000_000, 0usize..3), 0..15)
        ) {
            let tasks: Vec<Task> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (text, done, minute, p))| task(&format!("id-{i}"), &text, done, minute, Priority::ALL[p]))
                .collect();
            let mut store = TaskStore::new(MemoryStore::new());
            store.save(&tasks);
            prop_assert_eq!(store.load(), tasks);
        }
    }
}
