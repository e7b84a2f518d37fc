//! Housekeeping: the three-phase retention job over a [`Store`].
//!
//! Every invocation runs, in order:
//!
//! 1. **archive**: completed root tasks in the archive tier become log
//!    entries (root plus subtasks) and the live tree is deleted.
//! 2. **purge**: completed root tasks past the archive tier are deleted with
//!    no log entry.
//! 3. **prune**: archived trees whose root completed before the archive tier
//!    are deleted, root entry and subtask entries together.
//!
//! Each phase fetches broadly, filters in memory through
//! [`RetentionPolicy`], and ends with exactly one `save`. A failing phase
//! discards its staged changes and aborts the run; phases that already saved
//! stay saved and are reported through the `committed` field of
//! [`Error::Housekeeping`]. Running again is always safe: nothing that was
//! handled matches any phase twice.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::archive::{archive_tree, TaskTree};
use crate::error::{Error, Result};
use crate::model::{Tag, TagId, Task, TaskId};
use crate::retention::{RetentionPolicy, Tier};
use crate::snapshot::TaskLogEntry;
use crate::store::{Store, StoreError, TaskFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Archive,
    Purge,
    Prune,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Archive => "archive",
            Phase::Purge => "purge",
            Phase::Prune => "prune",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of root-level actions. Subtasks carried along with their root are
/// not counted separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingStats {
    pub tasks_archived: usize,
    pub tasks_deleted: usize,
    pub logs_deleted: usize,
}

impl HousekeepingStats {
    pub fn total_actions(&self) -> usize {
        self.tasks_archived + self.tasks_deleted + self.logs_deleted
    }

    pub fn is_empty(&self) -> bool {
        self.total_actions() == 0
    }
}

/// What a run at a given instant would do, without doing it. Every list
/// holds root task ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HousekeepingPlan {
    pub archive: Vec<TaskId>,
    pub purge: Vec<TaskId>,
    /// Roots whose archived log entries would be pruned.
    pub prune: Vec<TaskId>,
}

impl HousekeepingPlan {
    pub fn stats(&self) -> HousekeepingStats {
        HousekeepingStats {
            tasks_archived: self.archive.len(),
            tasks_deleted: self.purge.len(),
            logs_deleted: self.prune.len(),
        }
    }
}

enum PhaseFailure {
    Store {
        operation: String,
        source: StoreError,
    },
    Rejected(Error),
}

type PhaseResult<T> = std::result::Result<T, PhaseFailure>;

fn store_step(operation: impl Into<String>) -> impl FnOnce(StoreError) -> PhaseFailure {
    let operation = operation.into();
    move |source| PhaseFailure::Store { operation, source }
}

/// Runs housekeeping against a store. Callers serialize invocations; the
/// exclusive borrow of the store enforces that within a process.
pub struct Housekeeper<'a, S: Store + ?Sized> {
    store: &'a mut S,
    policy: RetentionPolicy,
}

impl<'a, S: Store + ?Sized> Housekeeper<'a, S> {
    pub fn new(store: &'a mut S, policy: RetentionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn perform_housekeeping(&mut self, now: DateTime<Utc>) -> Result<HousekeepingStats> {
        tracing::debug!(now = %now.to_rfc3339(), "housekeeping started");
        let mut stats = HousekeepingStats::default();

        stats.tasks_archived = self.run_phase(Phase::Archive, stats, |hk| hk.archive_phase(now))?;
        stats.tasks_deleted = self.run_phase(Phase::Purge, stats, |hk| hk.purge_phase(now))?;
        stats.logs_deleted = self.run_phase(Phase::Prune, stats, |hk| hk.prune_phase(now))?;

        if stats.is_empty() {
            tracing::debug!("housekeeping complete: nothing to do");
        } else {
            tracing::info!(
                tasks_archived = stats.tasks_archived,
                tasks_deleted = stats.tasks_deleted,
                logs_deleted = stats.logs_deleted,
                "housekeeping complete"
            );
        }
        Ok(stats)
    }

    /// Dry run: list the roots and log entries a run at `now` would touch.
    pub fn plan(&self, now: DateTime<Utc>) -> Result<HousekeepingPlan> {
        let completed = self
            .store
            .fetch_tasks(TaskFilter::Completed)
            .map_err(|source| Error::store("fetch completed tasks", source))?;
        let entries = self
            .store
            .fetch_log_entries()
            .map_err(|source| Error::store("fetch log entries", source))?;

        let mut plan = HousekeepingPlan::default();
        for task in self.roots_in_tier(completed.clone(), Tier::Archive, now) {
            plan.archive.push(task.id);
        }
        for task in self.roots_in_tier(completed, Tier::Purge, now) {
            plan.purge.push(task.id);
        }
        plan.prune = self.prunable_roots(&entries, now).into_iter().collect();
        Ok(plan)
    }

    fn run_phase<F>(&mut self, phase: Phase, committed: HousekeepingStats, run: F) -> Result<usize>
    where
        F: FnOnce(&mut Self) -> PhaseResult<usize>,
    {
        match run(self) {
            Ok(count) => {
                tracing::debug!(phase = phase.as_str(), count, "housekeeping phase saved");
                Ok(count)
            }
            Err(failure) => {
                self.store.discard();
                match failure {
                    PhaseFailure::Store { operation, source } => {
                        tracing::warn!(
                            phase = phase.as_str(),
                            operation = %operation,
                            error = %source,
                            "housekeeping phase aborted"
                        );
                        Err(Error::Housekeeping {
                            phase,
                            operation,
                            committed,
                            source,
                        })
                    }
                    PhaseFailure::Rejected(err) => {
                        tracing::warn!(
                            phase = phase.as_str(),
                            error = %err,
                            "housekeeping phase aborted"
                        );
                        Err(Error::PhaseRejected {
                            phase,
                            committed,
                            source: Box::new(err),
                        })
                    }
                }
            }
        }
    }

    fn archive_phase(&mut self, now: DateTime<Utc>) -> PhaseResult<usize> {
        let completed = self
            .store
            .fetch_tasks(TaskFilter::Completed)
            .map_err(store_step("fetch completed tasks"))?;
        let roots = self.roots_in_tier(completed, Tier::Archive, now);

        let mut archived = 0;
        if !roots.is_empty() {
            let tags: HashMap<TagId, Tag> = self
                .store
                .fetch_tags()
                .map_err(store_step("fetch tags"))?
                .into_iter()
                .map(|tag| (tag.id.clone(), tag))
                .collect();

            for root in roots {
                let root_id = root.id.clone();
                let tree = TaskTree::load(&*self.store, root, &tags)
                    .map_err(store_step(format!("load subtasks of task {root_id}")))?;
                let entries = archive_tree(&tree, now).map_err(PhaseFailure::Rejected)?;
                for entry in entries {
                    let operation = format!("insert log entry for task {}", entry.task_id());
                    self.store
                        .insert_log_entry(entry)
                        .map_err(store_step(operation))?;
                }
                self.store
                    .delete_task(&root_id)
                    .map_err(store_step(format!("delete task {root_id}")))?;
                tracing::debug!(task = %root_id, subtasks = tree.task_count() - 1, "archived task");
                archived += 1;
            }
        }

        self.store.save().map_err(store_step("save"))?;
        Ok(archived)
    }

    fn purge_phase(&mut self, now: DateTime<Utc>) -> PhaseResult<usize> {
        let completed = self
            .store
            .fetch_tasks(TaskFilter::Completed)
            .map_err(store_step("fetch completed tasks"))?;
        let roots = self.roots_in_tier(completed, Tier::Purge, now);

        let mut deleted = 0;
        for root in roots {
            self.store
                .delete_task(&root.id)
                .map_err(store_step(format!("delete task {}", root.id)))?;
            tracing::debug!(task = %root.id, "purged task");
            deleted += 1;
        }

        self.store.save().map_err(store_step("save"))?;
        Ok(deleted)
    }

    fn prune_phase(&mut self, now: DateTime<Utc>) -> PhaseResult<usize> {
        let entries = self
            .store
            .fetch_log_entries()
            .map_err(store_step("fetch log entries"))?;

        let roots = self.prunable_roots(&entries, now);
        for entry in entries
            .iter()
            .filter(|entry| roots.contains(entry.root_task_id()))
        {
            self.store
                .delete_log_entry(&entry.id())
                .map_err(store_step(format!("delete log entry {}", entry.id())))?;
        }
        for root in &roots {
            tracing::debug!(task = %root, "pruned archived task");
        }

        self.store.save().map_err(store_step("save"))?;
        Ok(roots.len())
    }

    /// Roots of archived trees past retention. Entries of one tree share the
    /// root's completion, so a tree is pruned whole or not at all.
    fn prunable_roots(&self, entries: &[TaskLogEntry], now: DateTime<Utc>) -> BTreeSet<TaskId> {
        entries
            .iter()
            .filter(|entry| self.policy.should_prune(entry, now))
            .map(|entry| entry.root_task_id().clone())
            .collect()
    }

    /// Root tasks in `tier`, oldest completion first.
    fn roots_in_tier(&self, tasks: Vec<Task>, tier: Tier, now: DateTime<Utc>) -> Vec<Task> {
        let mut roots: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.policy.tier_for(task, now) == Some(tier))
            .collect();
        roots.sort_by(|a, b| {
            a.completed_at
                .cmp(&b.completed_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        roots
    }
}

/// Run housekeeping once with `policy` against `store`.
pub fn perform_housekeeping<S: Store + ?Sized>(
    store: &mut S,
    policy: RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<HousekeepingStats> {
    Housekeeper::new(store, policy).perform_housekeeping(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn completed_root(title: &str, days_ago: i64) -> Task {
        Task::new(title, now() - Duration::days(days_ago + 5))
            .completed(now() - Duration::days(days_ago))
    }

    #[test]
    fn stats_totals() {
        let stats = HousekeepingStats {
            tasks_archived: 2,
            tasks_deleted: 1,
            logs_deleted: 4,
        };
        assert_eq!(stats.total_actions(), 7);
        assert!(!stats.is_empty());
        assert!(HousekeepingStats::default().is_empty());
    }

    #[test]
    fn every_phase_saves_once() {
        let mut store = MemoryStore::new();
        perform_housekeeping(&mut store, RetentionPolicy::default(), now()).expect("run");
        assert_eq!(store.save_count(), 3);
    }

    #[test]
    fn plan_matches_run() {
        let mut store = MemoryStore::new();
        store
            .insert_task(completed_root("Fresh", 10))
            .expect("fresh");
        store
            .insert_task(completed_root("Archive me", 120))
            .expect("archive");
        store
            .insert_task(completed_root("Purge me", 500))
            .expect("purge");
        store.save().expect("seed");

        let plan = Housekeeper::new(&mut store, RetentionPolicy::default())
            .plan(now())
            .expect("plan");
        assert_eq!(plan.archive.len(), 1);
        assert_eq!(plan.purge.len(), 1);
        assert!(plan.prune.is_empty());

        let stats = perform_housekeeping(&mut store, RetentionPolicy::default(), now())
            .expect("run");
        assert_eq!(stats, plan.stats());
    }

    #[test]
    fn roots_are_processed_oldest_first() {
        let mut store = MemoryStore::new();
        let newer = completed_root("Newer", 100);
        let older = completed_root("Older", 200);
        store.insert_task(newer.clone()).expect("newer");
        store.insert_task(older.clone()).expect("older");

        let plan = Housekeeper::new(&mut store, RetentionPolicy::default())
            .plan(now())
            .expect("plan");
        assert_eq!(plan.archive, vec![older.id, newer.id]);
    }

    #[test]
    fn rejected_record_keeps_committed_stats() {
        let mut store = MemoryStore::new();
        store
            .insert_task(completed_root("Staged", 10))
            .expect("staged");
        let committed = HousekeepingStats {
            tasks_archived: 2,
            ..HousekeepingStats::default()
        };

        let err = Housekeeper::new(&mut store, RetentionPolicy::default())
            .run_phase(Phase::Archive, committed, |_| {
                Err(PhaseFailure::Rejected(Error::IncompleteTask {
                    task_id: TaskId::from("t1"),
                    field: "completion timestamp",
                }))
            })
            .expect_err("rejected");

        match &err {
            Error::PhaseRejected {
                phase,
                committed: reported,
                source,
            } => {
                assert_eq!(*phase, Phase::Archive);
                assert_eq!(*reported, committed);
                assert!(matches!(**source, Error::IncompleteTask { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.details().expect("details")["committed"]["tasks_archived"], 2);
        assert!(!store.has_unsaved_changes());
    }

    #[test]
    fn phase_display_names() {
        assert_eq!(Phase::Archive.to_string(), "archive");
        assert_eq!(Phase::Purge.to_string(), "purge");
        assert_eq!(Phase::Prune.to_string(), "prune");
    }
}
