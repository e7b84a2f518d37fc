//! Persistence collaborator used by housekeeping and the completion queries.
//!
//! A store behaves like a unit-of-work context: inserts and deletes are
//! staged, reads observe staged changes, [`Store::save`] commits them and
//! [`Store::discard`] drops them. Deleting a task cascades to its subtasks and
//! attachments inside the same unit of work.
//!
//! The only native predicate is [`TaskFilter`], which filters on the
//! non-optional completion flag. Comparisons on optional dates are always
//! done by the caller over fetched records.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{Tag, TagId, Task, TaskId};
use crate::snapshot::{LogEntryId, TaskLogEntry};

mod file;
mod memory;
mod state;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use state::StoreState;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error("Store was modified by another writer (expected revision {expected}, found {found})")]
    Conflict { expected: u64, found: u64 },

    #[error("Unsupported store schema '{0}'")]
    UnsupportedSchema(String),

    #[error("Store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    /// Tasks whose completion flag is set. Says nothing about the date.
    Completed,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Completed => task.is_completed,
        }
    }
}

/// Store entry points, named for fault injection and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    FetchTasks,
    FetchTask,
    FetchTags,
    FetchLogEntries,
    InsertTask,
    InsertTag,
    InsertLogEntry,
    DeleteTask,
    DeleteTag,
    DeleteLogEntry,
    Save,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::FetchTasks => "fetch_tasks",
            StoreOperation::FetchTask => "fetch_task",
            StoreOperation::FetchTags => "fetch_tags",
            StoreOperation::FetchLogEntries => "fetch_log_entries",
            StoreOperation::InsertTask => "insert_task",
            StoreOperation::InsertTag => "insert_tag",
            StoreOperation::InsertLogEntry => "insert_log_entry",
            StoreOperation::DeleteTask => "delete_task",
            StoreOperation::DeleteTag => "delete_tag",
            StoreOperation::DeleteLogEntry => "delete_log_entry",
            StoreOperation::Save => "save",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Store {
    fn fetch_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>>;

    fn fetch_task(&self, id: &TaskId) -> StoreResult<Option<Task>>;

    fn fetch_tags(&self) -> StoreResult<Vec<Tag>>;

    fn fetch_log_entries(&self) -> StoreResult<Vec<TaskLogEntry>>;

    /// Stage a new task. A subtask is appended to its parent's subtask list.
    fn insert_task(&mut self, task: Task) -> StoreResult<()>;

    fn insert_tag(&mut self, tag: Tag) -> StoreResult<()>;

    /// Stage a log entry. At most one entry may exist per original task id.
    fn insert_log_entry(&mut self, entry: TaskLogEntry) -> StoreResult<()>;

    /// Stage deletion of a task together with its subtasks and attachments.
    fn delete_task(&mut self, id: &TaskId) -> StoreResult<()>;

    /// Stage deletion of a tag; tasks referencing it drop the reference.
    fn delete_tag(&mut self, id: &TagId) -> StoreResult<()>;

    fn delete_log_entry(&mut self, id: &LogEntryId) -> StoreResult<()>;

    /// Commit everything staged since the last save.
    fn save(&mut self) -> StoreResult<()>;

    /// Drop everything staged since the last save.
    fn discard(&mut self);
}
