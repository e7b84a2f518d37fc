//! taskkeep housekeep command implementation

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::housekeeping::{Housekeeper, HousekeepingPlan, HousekeepingStats};
use crate::output::{emit_success, HumanReport, OutputOptions};
use crate::retention::RetentionPolicy;

pub struct HousekeepOptions {
    pub now: Option<String>,
    pub dry_run: bool,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct HousekeepReport {
    now: DateTime<Utc>,
    dry_run: bool,
    active_days: u32,
    archive_through_days: u32,
    stats: HousekeepingStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<HousekeepingPlan>,
}

pub fn run(options: HousekeepOptions) -> Result<()> {
    let now = super::resolve_now(options.now.as_deref())?;
    let mut ctx = super::open_context(options.root)?;
    let policy = RetentionPolicy::from_config(&ctx.config.retention)?;

    let mut housekeeper = Housekeeper::new(&mut ctx.store, policy);
    let (stats, plan) = if options.dry_run {
        let plan = housekeeper.plan(now)?;
        (plan.stats(), Some(plan))
    } else {
        (housekeeper.perform_housekeeping(now)?, None)
    };

    let report = HousekeepReport {
        now,
        dry_run: options.dry_run,
        active_days: policy.active_days(),
        archive_through_days: policy.archive_through_days(),
        stats,
        plan,
    };

    let header = match (options.dry_run, stats.is_empty()) {
        (true, true) => "taskkeep housekeep: nothing would change",
        (true, false) => "taskkeep housekeep: dry run",
        (false, true) => "taskkeep housekeep: nothing to do",
        (false, false) => "taskkeep housekeep: done",
    };

    let mut human = HumanReport::new(header);
    human.field("now", super::format_time(now));
    human.field("tasks archived", stats.tasks_archived);
    human.field("tasks deleted", stats.tasks_deleted);
    human.field("logs deleted", stats.logs_deleted);
    if let Some(plan) = &report.plan {
        for id in &plan.archive {
            human.item(format!("archive task {id}"));
        }
        for id in &plan.purge {
            human.item(format!("purge task {id}"));
        }
        for id in &plan.prune {
            human.item(format!("prune archived task {id}"));
        }
        if !stats.is_empty() {
            human.hint("taskkeep housekeep");
        }
    }
    human.field("store", ctx.storage.store_file().display().to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "housekeep",
        &report,
        &human,
    )
}
