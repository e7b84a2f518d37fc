//! In-memory entity tables shared by the store implementations.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::{Tag, TagId, Task, TaskId};
use crate::snapshot::{LogEntryId, TaskLogEntry};

use super::{StoreError, StoreResult, TaskFilter};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    tasks: BTreeMap<TaskId, Task>,
    tags: BTreeMap<TagId, Tag>,
    log_entries: BTreeMap<LogEntryId, TaskLogEntry>,
}

impl StoreState {
    pub fn from_parts(
        tasks: Vec<Task>,
        tags: Vec<Tag>,
        log_entries: Vec<TaskLogEntry>,
    ) -> Self {
        let mut state = Self {
            tasks: tasks.into_iter().map(|task| (task.id.clone(), task)).collect(),
            tags: tags.into_iter().map(|tag| (tag.id.clone(), tag)).collect(),
            log_entries: log_entries
                .into_iter()
                .map(|entry| (entry.id(), entry))
                .collect(),
        };
        state.relink_subtasks();
        state
    }

    /// Append children that point at a parent which does not list them, so
    /// the ordered subtask lists and the parent links describe one tree.
    fn relink_subtasks(&mut self) {
        let missing: Vec<(TaskId, TaskId)> = self
            .tasks
            .values()
            .filter_map(|task| {
                let parent_id = task.parent.as_ref()?;
                let parent = self.tasks.get(parent_id)?;
                (!parent.subtasks.contains(&task.id)).then(|| (parent_id.clone(), task.id.clone()))
            })
            .collect();
        for (parent_id, child_id) in missing {
            tracing::debug!(task = %parent_id, subtask = %child_id, "relinking subtask");
            if let Some(parent) = self.tasks.get_mut(&parent_id) {
                parent.subtasks.push(child_id);
            }
        }
    }

    pub fn into_parts(self) -> (Vec<Task>, Vec<Tag>, Vec<TaskLogEntry>) {
        (
            self.tasks.into_values().collect(),
            self.tags.into_values().collect(),
            self.log_entries.into_values().collect(),
        )
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn log_entry_count(&self) -> usize {
        self.log_entries.len()
    }

    pub fn tasks(&self, filter: TaskFilter) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id).cloned()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.values().cloned().collect()
    }

    pub fn log_entries(&self) -> Vec<TaskLogEntry> {
        self.log_entries.values().cloned().collect()
    }

    pub fn insert_task(&mut self, task: Task) -> StoreResult<()> {
        if self.tasks.contains_key(&task.id) {
            return Err(StoreError::Duplicate {
                kind: "task",
                id: task.id.to_string(),
            });
        }
        if let Some(tag_id) = task.tags.iter().find(|id| !self.tags.contains_key(*id)) {
            return Err(StoreError::NotFound {
                kind: "tag",
                id: tag_id.to_string(),
            });
        }
        if let Some(parent_id) = &task.parent {
            let parent = self
                .tasks
                .get_mut(parent_id)
                .ok_or_else(|| StoreError::NotFound {
                    kind: "parent task",
                    id: parent_id.to_string(),
                })?;
            if !parent.subtasks.contains(&task.id) {
                parent.subtasks.push(task.id.clone());
            }
        }
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    pub fn insert_tag(&mut self, tag: Tag) -> StoreResult<()> {
        if self.tags.contains_key(&tag.id) {
            return Err(StoreError::Duplicate {
                kind: "tag",
                id: tag.id.to_string(),
            });
        }
        self.tags.insert(tag.id.clone(), tag);
        Ok(())
    }

    pub fn insert_log_entry(&mut self, entry: TaskLogEntry) -> StoreResult<()> {
        if self.log_entries.contains_key(&entry.id()) {
            return Err(StoreError::Duplicate {
                kind: "log entry",
                id: entry.id().to_string(),
            });
        }
        if self
            .log_entries
            .values()
            .any(|existing| existing.task_id() == entry.task_id())
        {
            return Err(StoreError::Duplicate {
                kind: "log entry for task",
                id: entry.task_id().to_string(),
            });
        }
        self.log_entries.insert(entry.id(), entry);
        Ok(())
    }

    /// Remove a task and every descendant. Returns the number of task
    /// records removed.
    pub fn delete_task(&mut self, id: &TaskId) -> StoreResult<usize> {
        let root = self.tasks.get(id).ok_or_else(|| StoreError::NotFound {
            kind: "task",
            id: id.to_string(),
        })?;
        let parent = root.parent.clone();

        let doomed = self.descendants_inclusive(id);
        for task_id in &doomed {
            self.tasks.remove(task_id);
        }

        if let Some(parent) = parent.and_then(|parent_id| self.tasks.get_mut(&parent_id)) {
            parent.subtasks.retain(|child| child != id);
        }
        Ok(doomed.len())
    }

    pub fn delete_tag(&mut self, id: &TagId) -> StoreResult<()> {
        if self.tags.remove(id).is_none() {
            return Err(StoreError::NotFound {
                kind: "tag",
                id: id.to_string(),
            });
        }
        for task in self.tasks.values_mut() {
            task.tags.retain(|tag_id| tag_id != id);
        }
        Ok(())
    }

    pub fn delete_log_entry(&mut self, id: &LogEntryId) -> StoreResult<()> {
        match self.log_entries.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                kind: "log entry",
                id: id.to_string(),
            }),
        }
    }

    /// Follows both the ordered subtask lists and parent back-references so a
    /// child missing from its parent's list is still collected.
    fn descendants_inclusive(&self, id: &TaskId) -> BTreeSet<TaskId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([id.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(task) = self.tasks.get(&current) {
                queue.extend(task.subtasks.iter().cloned());
            }
            queue.extend(
                self.tasks
                    .values()
                    .filter(|task| task.parent.as_ref() == Some(&current))
                    .map(|task| task.id.clone()),
            );
        }
        seen.retain(|task_id| self.tasks.contains_key(task_id));
        seen
    }
}
