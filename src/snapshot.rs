//! Archived task log entries.
//!
//! A [`TaskLogEntry`] is a flattened copy of a completed task taken when the
//! task leaves the active tier. It holds no references to tasks or tags, only
//! copied values, so it stays readable after every entity it came from has
//! been deleted. Entries are built once by [`crate::archive`] and never
//! mutated afterwards; the fields are private to keep it that way.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Priority, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntryId(Uuid);

impl LogEntryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLogEntry {
    id: LogEntryId,
    task_id: TaskId,
    title: String,
    #[serde(default)]
    description: String,
    completed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<DateTime<Utc>>,
    priority: Priority,
    was_overdue: bool,
    subtask_count: u32,
    completed_subtask_count: u32,
    was_subtask: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_title: Option<String>,
    #[serde(default)]
    tag_names: Vec<String>,
    /// Seconds from creation to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_secs: Option<i64>,
    /// Root of the tree this entry was archived with. Equal to `task_id` for
    /// a root entry.
    root_task_id: TaskId,
    root_completed_at: DateTime<Utc>,
    archived_at: DateTime<Utc>,
}

/// Copied values a log entry is built from. Only the archive transformer
/// fills one in.
#[derive(Debug, Clone)]
pub(crate) struct LogEntryFields {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub completed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub was_overdue: bool,
    pub subtask_count: u32,
    pub completed_subtask_count: u32,
    pub parent_title: Option<String>,
    pub tag_names: Vec<String>,
    pub root_task_id: TaskId,
    pub root_completed_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
}

impl TaskLogEntry {
    pub(crate) fn from_fields(fields: LogEntryFields) -> Self {
        let elapsed = fields.completed_at - fields.created_at;
        let completion_secs = (elapsed >= Duration::zero()).then(|| elapsed.num_seconds());
        Self {
            id: LogEntryId::generate(),
            task_id: fields.task_id,
            title: fields.title,
            description: fields.description,
            completed_at: fields.completed_at,
            created_at: fields.created_at,
            due_at: fields.due_at,
            priority: fields.priority,
            was_overdue: fields.was_overdue,
            subtask_count: fields.subtask_count,
            completed_subtask_count: fields.completed_subtask_count,
            was_subtask: fields.parent_title.is_some(),
            parent_title: fields.parent_title,
            tag_names: fields.tag_names,
            completion_secs,
            root_task_id: fields.root_task_id,
            root_completed_at: fields.root_completed_at,
            archived_at: fields.archived_at,
        }
    }

    pub fn id(&self) -> LogEntryId {
        self.id
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn was_overdue(&self) -> bool {
        self.was_overdue
    }

    pub fn subtask_count(&self) -> u32 {
        self.subtask_count
    }

    pub fn completed_subtask_count(&self) -> u32 {
        self.completed_subtask_count
    }

    pub fn was_subtask(&self) -> bool {
        self.was_subtask
    }

    pub fn parent_title(&self) -> Option<&str> {
        self.parent_title.as_deref()
    }

    pub fn tag_names(&self) -> &[String] {
        &self.tag_names
    }

    pub fn root_task_id(&self) -> &TaskId {
        &self.root_task_id
    }

    /// Completion of the root task. Retention ages the whole archived tree
    /// by this value.
    pub fn root_completed_at(&self) -> DateTime<Utc> {
        self.root_completed_at
    }

    pub fn archived_at(&self) -> DateTime<Utc> {
        self.archived_at
    }

    pub fn completion_duration(&self) -> Option<Duration> {
        self.completion_secs.map(Duration::seconds)
    }

    /// Compact duration label such as `3d 4h`, `2h 15m` or `45m`.
    pub fn duration_label(&self) -> Option<String> {
        let duration = self.completion_duration()?;
        let days = duration.num_days();
        let hours = duration.num_hours() - days * 24;
        let minutes = duration.num_minutes() - duration.num_hours() * 60;
        let label = if days > 0 {
            format!("{days}d {hours}h")
        } else if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        };
        Some(label)
    }

    /// `completed/total`, or `None` when the task had no subtasks.
    pub fn subtask_progress(&self) -> Option<String> {
        if self.subtask_count == 0 {
            return None;
        }
        Some(format!(
            "{}/{}",
            self.completed_subtask_count, self.subtask_count
        ))
    }

    /// Whole days between the root's completion and `now`.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        crate::retention::age_in_days(self.root_completed_at, now)
    }

    /// Case-insensitive substring match over title, description and tags.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self
                .tag_names
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }

    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        !needle.is_empty() && self.matches_lowercase(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields(created: DateTime<Utc>, completed: DateTime<Utc>) -> LogEntryFields {
        LogEntryFields {
            task_id: TaskId::from("task-1"),
            title: "Quarterly review".to_string(),
            description: "Prepare the Q3 deck".to_string(),
            completed_at: completed,
            created_at: created,
            due_at: None,
            priority: Priority::High,
            was_overdue: false,
            subtask_count: 0,
            completed_subtask_count: 0,
            parent_title: None,
            tag_names: vec!["Work".to_string()],
            root_task_id: TaskId::from("task-1"),
            root_completed_at: completed,
            archived_at: completed,
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn duration_label_scales_with_length() {
        let entry = TaskLogEntry::from_fields(fields(
            base(),
            base() + Duration::days(3) + Duration::hours(4),
        ));
        assert_eq!(entry.duration_label().as_deref(), Some("3d 4h"));

        let entry = TaskLogEntry::from_fields(fields(
            base(),
            base() + Duration::hours(2) + Duration::minutes(15),
        ));
        assert_eq!(entry.duration_label().as_deref(), Some("2h 15m"));

        let entry = TaskLogEntry::from_fields(fields(base(), base() + Duration::minutes(45)));
        assert_eq!(entry.duration_label().as_deref(), Some("45m"));
    }

    #[test]
    fn completion_before_creation_has_no_duration() {
        let entry = TaskLogEntry::from_fields(fields(base(), base() - Duration::hours(1)));
        assert_eq!(entry.completion_duration(), None);
        assert_eq!(entry.duration_label(), None);
    }

    #[test]
    fn subtask_entry_ages_with_its_root() {
        let root_completed = base() + Duration::days(200);
        let mut child = fields(base(), base() + Duration::days(1));
        child.parent_title = Some("Quarterly review".to_string());
        child.task_id = TaskId::from("task-2");
        child.root_completed_at = root_completed;
        let entry = TaskLogEntry::from_fields(child);

        assert_eq!(entry.root_task_id(), &TaskId::from("task-1"));
        assert_eq!(entry.root_completed_at(), root_completed);
        assert_eq!(entry.age_in_days(root_completed + Duration::days(10)), 10);
    }

    #[test]
    fn subtask_progress_only_with_subtasks() {
        let entry = TaskLogEntry::from_fields(fields(base(), base()));
        assert_eq!(entry.subtask_progress(), None);

        let mut with_children = fields(base(), base());
        with_children.subtask_count = 3;
        with_children.completed_subtask_count = 2;
        let entry = TaskLogEntry::from_fields(with_children);
        assert_eq!(entry.subtask_progress().as_deref(), Some("2/3"));
    }

    #[test]
    fn matches_is_case_insensitive_over_tags() {
        let entry = TaskLogEntry::from_fields(fields(base(), base()));
        assert!(entry.matches("QUARTERLY"));
        assert!(entry.matches("q3 deck"));
        assert!(entry.matches("work"));
        assert!(!entry.matches("holiday"));
        assert!(!entry.matches("   "));
    }

    #[test]
    fn was_subtask_follows_parent_title() {
        let mut child = fields(base(), base());
        child.parent_title = Some("Quarterly review".to_string());
        let entry = TaskLogEntry::from_fields(child);
        assert!(entry.was_subtask());
        assert_eq!(entry.parent_title(), Some("Quarterly review"));
    }
}
