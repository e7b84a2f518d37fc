use std::cell::RefCell;
use std::collections::HashMap;

use crate::model::{Tag, TagId, Task, TaskId};
use crate::snapshot::{LogEntryId, TaskLogEntry};

use super::{Store, StoreError, StoreOperation, StoreResult, StoreState, TaskFilter};

#[derive(Debug, Clone, Copy)]
struct Fault {
    /// Calls that still succeed before the fault fires.
    remaining_ok: u32,
}

/// Store kept entirely in process memory.
///
/// Faults can be armed per operation to exercise failure handling: an armed
/// operation returns [`StoreError::Backend`] once its allowance of successful
/// calls is used up, and keeps failing until [`MemoryStore::clear_faults`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: StoreState,
    working: StoreState,
    faults: RefCell<HashMap<StoreOperation, Fault>>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: StoreState) -> Self {
        Self {
            committed: state.clone(),
            working: state,
            ..Self::default()
        }
    }

    /// Fail every call to `operation`.
    pub fn fail_on(&self, operation: StoreOperation) {
        self.fail_after(operation, 0);
    }

    /// Let `successes` calls to `operation` through, then fail.
    pub fn fail_after(&self, operation: StoreOperation, successes: u32) {
        self.faults.borrow_mut().insert(
            operation,
            Fault {
                remaining_ok: successes,
            },
        );
    }

    pub fn clear_faults(&self) {
        self.faults.borrow_mut().clear();
    }

    /// Last committed state, ignoring anything staged.
    pub fn committed(&self) -> &StoreState {
        &self.committed
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.committed != self.working
    }

    /// Number of successful saves since construction.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        let mut faults = self.faults.borrow_mut();
        let Some(fault) = faults.get_mut(&operation) else {
            return Ok(());
        };
        if fault.remaining_ok > 0 {
            fault.remaining_ok -= 1;
            return Ok(());
        }
        Err(StoreError::Backend(format!("injected failure in {operation}")))
    }
}

impl Store for MemoryStore {
    fn fetch_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        self.check(StoreOperation::FetchTasks)?;
        Ok(self.working.tasks(filter))
    }

    fn fetch_task(&self, id: &TaskId) -> StoreResult<Option<Task>> {
        self.check(StoreOperation::FetchTask)?;
        Ok(self.working.task(id))
    }

    fn fetch_tags(&self) -> StoreResult<Vec<Tag>> {
        self.check(StoreOperation::FetchTags)?;
        Ok(self.working.tags())
    }

    fn fetch_log_entries(&self) -> StoreResult<Vec<TaskLogEntry>> {
        self.check(StoreOperation::FetchLogEntries)?;
        Ok(self.working.log_entries())
    }

    fn insert_task(&mut self, task: Task) -> StoreResult<()> {
        self.check(StoreOperation::InsertTask)?;
        self.working.insert_task(task)
    }

    fn insert_tag(&mut self, tag: Tag) -> StoreResult<()> {
        self.check(StoreOperation::InsertTag)?;
        self.working.insert_tag(tag)
    }

    fn insert_log_entry(&mut self, entry: TaskLogEntry) -> StoreResult<()> {
        self.check(StoreOperation::InsertLogEntry)?;
        self.working.insert_log_entry(entry)
    }

    fn delete_task(&mut self, id: &TaskId) -> StoreResult<()> {
        self.check(StoreOperation::DeleteTask)?;
        self.working.delete_task(id).map(|_| ())
    }

    fn delete_tag(&mut self, id: &TagId) -> StoreResult<()> {
        self.check(StoreOperation::DeleteTag)?;
        self.working.delete_tag(id)
    }

    fn delete_log_entry(&mut self, id: &LogEntryId) -> StoreResult<()> {
        self.check(StoreOperation::DeleteLogEntry)?;
        self.working.delete_log_entry(id)
    }

    fn save(&mut self) -> StoreResult<()> {
        self.check(StoreOperation::Save)?;
        self.committed = self.working.clone();
        self.saves += 1;
        Ok(())
    }

    fn discard(&mut self) {
        self.working = self.committed.clone();
    }
}
