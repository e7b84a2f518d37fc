//! taskkeep status command implementation

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, HumanReport, OutputOptions};
use crate::query::{CompletionCounts, CompletionQueries};
use crate::retention::RetentionPolicy;

pub struct StatusOptions {
    pub now: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct StatusReport {
    now: DateTime<Utc>,
    store: PathBuf,
    revision: u64,
    active_days: u32,
    archive_through_days: u32,
    counts: CompletionCounts,
}

pub fn run(options: StatusOptions) -> Result<()> {
    let now = super::resolve_now(options.now.as_deref())?;
    let ctx = super::open_context(options.root)?;
    let policy = RetentionPolicy::from_config(&ctx.config.retention)?;

    let counts = CompletionQueries::new(&ctx.store).completion_counts(&policy, now)?;

    let mut human = HumanReport::new("taskkeep status");
    human.field("store", ctx.storage.store_file().display().to_string());
    human.field(
        "active",
        format!("{} (<= {} days)", counts.active, policy.active_days()),
    );
    human.field(
        "awaiting archive",
        format!(
            "{} ({}..={} days)",
            counts.awaiting_archive,
            policy.active_days() + 1,
            policy.archive_through_days()
        ),
    );
    human.field(
        "awaiting purge",
        format!(
            "{} (> {} days)",
            counts.awaiting_purge,
            policy.archive_through_days()
        ),
    );
    human.field("log entries", counts.log_entries);
    if counts.awaiting_archive + counts.awaiting_purge > 0 {
        human.hint("taskkeep housekeep");
    }

    let report = StatusReport {
        now,
        store: ctx.storage.store_file(),
        revision: ctx.store.revision(),
        active_days: policy.active_days(),
        archive_through_days: policy.archive_through_days(),
        counts,
    };
    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "status",
        &report,
        &human,
    )
}
