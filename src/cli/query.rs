//! taskkeep recent / archived / search command implementations

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::model::{Priority, TagId, Task, TaskId};
use crate::output::{emit_success, HumanReport, OutputOptions};
use crate::query::CompletionQueries;
use crate::snapshot::TaskLogEntry;

use super::DayBound;

pub struct RecentOptions {
    pub days: Option<u32>,
    pub now: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ArchivedOptions {
    pub from: String,
    pub to: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct SearchOptions {
    pub query: String,
    pub days: Option<u32>,
    pub now: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Live task as shown by the CLI. Attachment payloads are left out.
#[derive(Serialize)]
struct TaskView {
    id: TaskId,
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_at: Option<DateTime<Utc>>,
    priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<TaskId>,
    subtask_count: usize,
    tags: Vec<TagId>,
    attachment_count: usize,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed_at: task.completion_date(),
            created_at: task.created_at,
            due_at: task.due_at,
            priority: task.priority,
            parent: task.parent.clone(),
            subtask_count: task.subtasks.len(),
            tags: task.tags.clone(),
            attachment_count: task.attachments.len(),
        }
    }
}

#[derive(Serialize)]
struct RecentReport {
    now: DateTime<Utc>,
    days: u32,
    tasks: Vec<TaskView>,
}

#[derive(Serialize)]
struct ArchivedReport {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    log_entries: Vec<TaskLogEntry>,
}

#[derive(Serialize)]
struct SearchReport {
    query: String,
    now: DateTime<Utc>,
    days: u32,
    tasks: Vec<TaskView>,
    log_entries: Vec<TaskLogEntry>,
}

pub fn run_recent(options: RecentOptions) -> Result<()> {
    let now = super::resolve_now(options.now.as_deref())?;
    let ctx = super::open_context(options.root)?;
    let days = super::resolve_days(options.days, ctx.config.queries.recent_days)?;

    let tasks = CompletionQueries::new(&ctx.store).recent_completions(now, days)?;

    let mut human = HumanReport::new(format!(
        "taskkeep recent: {} task(s) completed in the last {days} day(s)",
        tasks.len()
    ));
    for task in &tasks {
        human.item(task_line(task));
    }

    let report = RecentReport {
        now,
        days,
        tasks: tasks.iter().map(TaskView::from).collect(),
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "recent",
        &report,
        &human,
    )
}

pub fn run_archived(options: ArchivedOptions) -> Result<()> {
    let from = super::parse_instant("--from", &options.from, DayBound::Start)?;
    let to = super::parse_instant("--to", &options.to, DayBound::End)?;
    let ctx = super::open_context(options.root)?;

    let log_entries = CompletionQueries::new(&ctx.store).archived_completions(from, to)?;

    let mut human = HumanReport::new(format!(
        "taskkeep archived: {} log entr{} from {} to {}",
        log_entries.len(),
        if log_entries.len() == 1 { "y" } else { "ies" },
        super::format_time(from),
        super::format_time(to)
    ));
    for entry in &log_entries {
        human.item(entry_line(entry));
    }

    let report = ArchivedReport {
        from,
        to,
        log_entries,
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "archived",
        &report,
        &human,
    )
}

pub fn run_search(options: SearchOptions) -> Result<()> {
    let now = super::resolve_now(options.now.as_deref())?;
    let ctx = super::open_context(options.root)?;
    let days = super::resolve_days(options.days, ctx.config.queries.search_days)?;

    let results =
        CompletionQueries::new(&ctx.store).search_completions(&options.query, now, days)?;

    let mut human = HumanReport::new(format!(
        "taskkeep search: {} match(es) for '{}'",
        results.len(),
        options.query.trim()
    ));
    for task in &results.tasks {
        human.item(task_line(task));
    }
    for entry in &results.log_entries {
        human.item(format!("[archived] {}", entry_line(entry)));
    }
    if options.query.trim().is_empty() {
        human.warn("empty query matches nothing");
    }

    let report = SearchReport {
        query: options.query,
        now,
        days,
        tasks: results.tasks.iter().map(TaskView::from).collect(),
        log_entries: results.log_entries,
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "search",
        &report,
        &human,
    )
}

fn task_line(task: &Task) -> String {
    match task.completion_date() {
        Some(completed_at) => format!(
            "{} {} ({})",
            super::format_time(completed_at),
            task.title,
            task.id
        ),
        None => format!("{} ({})", task.title, task.id),
    }
}

fn entry_line(entry: &TaskLogEntry) -> String {
    let mut line = format!("{} {}", super::format_time(entry.completed_at()), entry.title());
    if let Some(parent) = entry.parent_title() {
        line.push_str(&format!(" < {parent}"));
    }
    let mut notes = Vec::new();
    if let Some(progress) = entry.subtask_progress() {
        notes.push(format!("subtasks {progress}"));
    }
    if let Some(label) = entry.duration_label() {
        notes.push(format!("took {label}"));
    }
    if entry.was_overdue() {
        notes.push("overdue".to_string());
    }
    if !entry.tag_names().is_empty() {
        notes.push(entry.tag_names().join(", "));
    }
    if !notes.is_empty() {
        line.push_str(&format!(" [{}]", notes.join("; ")));
    }
    line
}
