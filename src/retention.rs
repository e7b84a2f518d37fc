//! Retention tiers for completed tasks.
//!
//! | Tier    | Age (days)                   |
//! |---------|------------------------------|
//! | Active  | `age <= active_days`         |
//! | Archive | `active_days < age <= archive_through_days` |
//! | Purge   | `age > archive_through_days` |
//!
//! With the defaults that is 0..=90 active, 91..=365 archive, 366+ purge.
//! Log entries are aged by their root's completion against the same upper
//! bound and pruned from 366.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::RetentionConfig;
use crate::error::{Error, Result};
use crate::model::Task;
use crate::snapshot::TaskLogEntry;

pub const DEFAULT_ACTIVE_DAYS: u32 = 90;
pub const DEFAULT_ARCHIVE_THROUGH_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Active,
    Archive,
    Purge,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Active => "active",
            Tier::Archive => "archive",
            Tier::Purge => "purge",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole days elapsed from `completed_at` to `now`, truncated.
///
/// Completions in the future yield zero or a negative age.
pub fn age_in_days(completed_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(completed_at).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    active_days: u32,
    archive_through_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            active_days: DEFAULT_ACTIVE_DAYS,
            archive_through_days: DEFAULT_ARCHIVE_THROUGH_DAYS,
        }
    }
}

impl RetentionPolicy {
    pub fn new(active_days: u32, archive_through_days: u32) -> Result<Self> {
        if active_days == 0 {
            return Err(Error::InvalidConfig(
                "retention.active_days must be >= 1".to_string(),
            ));
        }
        if archive_through_days <= active_days {
            return Err(Error::InvalidConfig(format!(
                "retention.archive_through_days ({archive_through_days}) must be greater \
                 than retention.active_days ({active_days})"
            )));
        }
        Ok(Self {
            active_days,
            archive_through_days,
        })
    }

    pub fn from_config(config: &RetentionConfig) -> Result<Self> {
        Self::new(config.active_days, config.archive_through_days)
    }

    pub fn active_days(&self) -> u32 {
        self.active_days
    }

    pub fn archive_through_days(&self) -> u32 {
        self.archive_through_days
    }

    pub fn classify(&self, completed_at: DateTime<Utc>, now: DateTime<Utc>) -> Tier {
        let age = age_in_days(completed_at, now);
        if age <= i64::from(self.active_days) {
            Tier::Active
        } else if age <= i64::from(self.archive_through_days) {
            Tier::Archive
        } else {
            Tier::Purge
        }
    }

    /// Tier of a live task, or `None` when the policy does not apply to it:
    /// incomplete tasks and subtasks are never evaluated on their own.
    pub fn tier_for(&self, task: &Task, now: DateTime<Utc>) -> Option<Tier> {
        if !task.is_root() {
            return None;
        }
        let completed_at = task.completion_date()?;
        Some(self.classify(completed_at, now))
    }

    /// Log entries age with their root: a subtask entry is kept for as long
    /// as the root it was archived with.
    pub fn should_prune(&self, entry: &TaskLogEntry, now: DateTime<Utc>) -> bool {
        entry.age_in_days(now) > i64::from(self.archive_through_days)
    }
}
