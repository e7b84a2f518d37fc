use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT};
use crate::model::{Tag, TagId, Task, TaskId};
use crate::snapshot::{LogEntryId, TaskLogEntry};
use crate::storage::Storage;

use super::{Store, StoreError, StoreResult, StoreState, TaskFilter};

const STORE_SCHEMA_VERSION: &str = "taskkeep.store.v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: String,
    /// Bumped on every save; used to detect writers racing each other.
    revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    log_entries: Vec<TaskLogEntry>,
}

impl StoreDocument {
    fn empty() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION.to_string(),
            revision: 0,
            saved_at: None,
            tasks: Vec::new(),
            tags: Vec::new(),
            log_entries: Vec::new(),
        }
    }
}

/// Store persisted as a single JSON document under the data directory.
///
/// The document is loaded on open. Saves take the store lock, check that no
/// other writer saved since this store loaded, and replace the document
/// atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    storage: Storage,
    revision: u64,
    committed: StoreState,
    working: StoreState,
}

impl FileStore {
    /// Create the data directory and an empty document if none exists.
    pub fn init(storage: Storage) -> StoreResult<Self> {
        storage.init()?;
        if !storage.is_initialized() {
            let _lock = FileLock::acquire(storage.lock_file(), DEFAULT_LOCK_TIMEOUT)?;
            storage.write_json(&storage.store_file(), &StoreDocument::empty())?;
        }
        Self::open(storage)
    }

    /// Open the store, treating a missing document as empty.
    pub fn open(storage: Storage) -> StoreResult<Self> {
        let document = load_document(&storage)?;
        let revision = document.revision;
        let state = StoreState::from_parts(document.tasks, document.tags, document.log_entries);
        Ok(Self {
            storage,
            revision,
            committed: state.clone(),
            working: state,
        })
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

fn load_document(storage: &Storage) -> StoreResult<StoreDocument> {
    let path = storage.store_file();
    if !path.exists() {
        return Ok(StoreDocument::empty());
    }
    let document: StoreDocument = storage.read_json(&path)?;
    if document.schema_version != STORE_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema(document.schema_version));
    }
    Ok(document)
}

impl Store for FileStore {
    fn fetch_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(self.working.tasks(filter))
    }

    fn fetch_task(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        Ok(self.working.task(id))
    }

    fn fetch_tags(&self) -> StoreResult<Vec<Tag>> {
        Ok(self.working.tags())
    }

    fn fetch_log_entries(&self) -> StoreResult<Vec<TaskLogEntry>> {
        Ok(self.working.log_entries())
    }

    fn insert_task(&mut self, task: Task) -> StoreResult<()> {
        self.working.insert_task(task)
    }

    fn insert_tag(&mut self, tag: Tag) -> StoreResult<()> {
        self.working.insert_tag(tag)
    }

    fn insert_log_entry(&mut self, entry: TaskLogEntry) -> StoreResult<()> {
        self.working.insert_log_entry(entry)
    }

    fn delete_task(&mut self, id: &TaskId) -> StoreResult<()> {
        self.working.delete_task(id).map(|_| ())
    }

    fn delete_tag(&mut self, id: &TagId) -> StoreResult<()> {
        self.working.delete_tag(id)
    }

    fn delete_log_entry(&mut self, id: &LogEntryId) -> StoreResult<()> {
        self.working.delete_log_entry(id)
    }

    fn save(&mut self) -> StoreResult<()> {
        if self.working == self.committed {
            return Ok(());
        }

        let _lock = FileLock::acquire(self.storage.lock_file(), DEFAULT_LOCK_TIMEOUT)?;
        let on_disk = load_document(&self.storage)?;
        if on_disk.revision != self.revision {
            return Err(StoreError::Conflict {
                expected: self.revision,
                found: on_disk.revision,
            });
        }

        let (tasks, tags, log_entries) = self.working.clone().into_parts();
        let document = StoreDocument {
            schema_version: STORE_SCHEMA_VERSION.to_string(),
            revision: self.revision + 1,
            saved_at: Some(Utc::now()),
            tasks,
            tags,
            log_entries,
        };
        self.storage
            .write_json(&self.storage.store_file(), &document)?;

        self.revision = document.revision;
        self.committed = self.working.clone();
        Ok(())
    }

    fn discard(&mut self) {
        self.working = self.committed.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use chrono::TimeZone;

    fn storage(root: &std::path::Path) -> Storage {
        Storage::for_root(root.to_path_buf(), &StoreConfig::default())
    }

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 7, 30, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn init_writes_empty_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::init(storage(dir.path())).expect("init");
        assert!(store.storage().store_file().exists());
        assert_eq!(store.revision(), 0);
        assert!(store.fetch_tasks(TaskFilter::All).expect("fetch").is_empty());
    }

    #[test]
    fn saved_tasks_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::init(storage(dir.path())).expect("init");
        let tag = Tag::new("Home");
        store.insert_tag(tag.clone()).expect("tag");
        store
            .insert_task(Task::new("Water plants", created()).with_tag(&tag))
            .expect("task");
        store.save().expect("save");

        let reopened = FileStore::open(storage(dir.path())).expect("reopen");
        assert_eq!(reopened.revision(), 1);
        let tasks = reopened.fetch_tasks(TaskFilter::All).expect("fetch");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].tags, vec![tag.id]);
    }

    #[test]
    fn unsaved_changes_are_not_persisted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::init(storage(dir.path())).expect("init");
        store
            .insert_task(Task::new("Scratch", created()))
            .expect("task");
        store.discard();
        store.save().expect("save without changes");

        let reopened = FileStore::open(storage(dir.path())).expect("reopen");
        assert!(reopened.fetch_tasks(TaskFilter::All).expect("fetch").is_empty());
        assert_eq!(reopened.revision(), 0);
    }

    #[test]
    fn concurrent_writer_is_detected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut first = FileStore::init(storage(dir.path())).expect("init");
        let mut second = FileStore::open(storage(dir.path())).expect("open");

        first
            .insert_task(Task::new("First", created()))
            .expect("task");
        first.save().expect("first save");

        second
            .insert_task(Task::new("Second", created()))
            .expect("task");
        let err = second.save().expect_err("stale writer");
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 0,
                found: 1
            }
        ));
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(dir.path());
        storage.init().expect("init dir");
        std::fs::write(
            storage.store_file(),
            r#"{"schema_version":"other.v9","revision":0}"#,
        )
        .expect("write");

        let err = FileStore::open(storage).expect_err("schema");
        assert!(matches!(err, StoreError::UnsupportedSchema(v) if v == "other.v9"));
    }
}
