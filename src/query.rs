//! Read-side helpers over completed tasks and log entries.
//!
//! Every query fetches the broad set (all completed tasks, or all log
//! entries) and filters in memory. Date comparisons never go through the
//! store's own predicates because completion dates are optional.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Task;
use crate::retention::{age_in_days, RetentionPolicy, Tier};
use crate::snapshot::TaskLogEntry;
use crate::store::{Store, TaskFilter};

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompletionSearch {
    pub tasks: Vec<Task>,
    pub log_entries: Vec<TaskLogEntry>,
}

impl CompletionSearch {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.log_entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + self.log_entries.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionCounts {
    pub active: usize,
    pub awaiting_archive: usize,
    pub awaiting_purge: usize,
    pub log_entries: usize,
}

pub struct CompletionQueries<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> CompletionQueries<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Completed tasks finished within the last `max_age_days`, newest
    /// first. Completions stamped after `now` are left out.
    pub fn recent_completions(&self, now: DateTime<Utc>, max_age_days: u32) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .completed_tasks()?
            .into_iter()
            .filter(|task| {
                task.completion_date()
                    .map(|completed_at| within_window(completed_at, now, max_age_days))
                    .unwrap_or(false)
            })
            .collect();
        sort_tasks_newest_first(&mut tasks);
        Ok(tasks)
    }

    /// Log entries completed between `start` and `end`, both inclusive,
    /// newest first.
    pub fn archived_completions(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TaskLogEntry>> {
        if start > end {
            return Err(Error::InvalidArgument(format!(
                "range start {} is after range end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        let mut entries: Vec<TaskLogEntry> = self
            .log_entries()?
            .into_iter()
            .filter(|entry| entry.completed_at() >= start && entry.completed_at() <= end)
            .collect();
        sort_entries_newest_first(&mut entries);
        Ok(entries)
    }

    /// Case-insensitive substring search over live completions (title,
    /// description) and log entries (title, description, tag names) within
    /// `max_age_days`. A blank query matches nothing.
    pub fn search_completions(
        &self,
        query: &str,
        now: DateTime<Utc>,
        max_age_days: u32,
    ) -> Result<CompletionSearch> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(CompletionSearch::default());
        }

        let mut tasks: Vec<Task> = self
            .completed_tasks()?
            .into_iter()
            .filter(|task| {
                task.completion_date()
                    .map(|completed_at| within_window(completed_at, now, max_age_days))
                    .unwrap_or(false)
            })
            .filter(|task| {
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            })
            .collect();
        sort_tasks_newest_first(&mut tasks);

        let mut log_entries: Vec<TaskLogEntry> = self
            .log_entries()?
            .into_iter()
            .filter(|entry| within_window(entry.completed_at(), now, max_age_days))
            .filter(|entry| entry.matches_lowercase(&needle))
            .collect();
        sort_entries_newest_first(&mut log_entries);

        Ok(CompletionSearch { tasks, log_entries })
    }

    /// Completed root tasks per retention tier, plus the log entry count.
    pub fn completion_counts(
        &self,
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
    ) -> Result<CompletionCounts> {
        let mut counts = CompletionCounts::default();
        for task in self.completed_tasks()? {
            match policy.tier_for(&task, now) {
                Some(Tier::Active) => counts.active += 1,
                Some(Tier::Archive) => counts.awaiting_archive += 1,
                Some(Tier::Purge) => counts.awaiting_purge += 1,
                None => {}
            }
        }
        counts.log_entries = self.log_entries()?.len();
        Ok(counts)
    }

    fn completed_tasks(&self) -> Result<Vec<Task>> {
        self.store
            .fetch_tasks(TaskFilter::Completed)
            .map_err(|source| Error::store("fetch completed tasks", source))
    }

    fn log_entries(&self) -> Result<Vec<TaskLogEntry>> {
        self.store
            .fetch_log_entries()
            .map_err(|source| Error::store("fetch log entries", source))
    }
}

fn within_window(completed_at: DateTime<Utc>, now: DateTime<Utc>, max_age_days: u32) -> bool {
    completed_at <= now && age_in_days(completed_at, now) <= i64::from(max_age_days)
}

fn sort_tasks_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.completed_at
            .cmp(&a.completed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn sort_entries_newest_first(entries: &mut [TaskLogEntry]) {
    entries.sort_by(|a, b| {
        b.completed_at()
            .cmp(&a.completed_at())
            .then_with(|| a.task_id().cmp(b.task_id()))
    });
}
