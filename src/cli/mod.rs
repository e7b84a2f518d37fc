//! Command-line interface for taskkeep
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is implemented in its own submodule.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::store::FileStore;

mod housekeep;
mod init;
mod query;
mod status;

/// taskkeep - tiered retention for completed tasks
///
/// Keeps recently completed tasks live, flattens older ones into an archive
/// log, and purges what is past retention.
#[derive(Parser, Debug)]
#[command(name = "taskkeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding `.taskkeep.toml` and the data directory (defaults to current directory)
    #[arg(long, global = true, env = "TASKKEEP_ROOT")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, an empty store and a default config
    Init,

    /// Archive, purge and prune completed tasks by age
    Housekeep {
        /// Reference instant (RFC 3339 or YYYY-MM-DD); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Show what would happen without changing the store
        #[arg(long)]
        dry_run: bool,
    },

    /// List tasks completed within the last N days
    Recent {
        /// Window in days (defaults to queries.recent_days)
        #[arg(long)]
        days: Option<u32>,

        /// Reference instant (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        now: Option<String>,
    },

    /// List archived log entries completed within a date range
    Archived {
        /// Range start, inclusive (RFC 3339 or YYYY-MM-DD)
        #[arg(long, required = true)]
        from: String,

        /// Range end, inclusive (RFC 3339 or YYYY-MM-DD)
        #[arg(long, required = true)]
        to: String,
    },

    /// Search completed tasks and archived log entries
    Search {
        /// Case-insensitive text to look for
        query: String,

        /// Window in days (defaults to queries.search_days)
        #[arg(long)]
        days: Option<u32>,

        /// Reference instant (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        now: Option<String>,
    },

    /// Show completed task counts per retention tier
    Status {
        /// Reference instant (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        now: Option<String>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(init::InitOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Housekeep { now, dry_run } => housekeep::run(housekeep::HousekeepOptions {
                now,
                dry_run,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Recent { days, now } => query::run_recent(query::RecentOptions {
                days,
                now,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Archived { from, to } => query::run_archived(query::ArchivedOptions {
                from,
                to,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Search { query, days, now } => query::run_search(query::SearchOptions {
                query,
                days,
                now,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Status { now } => status::run(status::StatusOptions {
                now,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}

/// Resolved root, its configuration and the opened store.
struct Context {
    config: Config,
    storage: Storage,
    store: FileStore,
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_context(root: Option<PathBuf>) -> Result<Context> {
    let root = resolve_root(root)?;
    let config = Config::load_from_root(&root);
    let storage = Storage::for_root(root, &config.store);
    if !storage.is_initialized() {
        return Err(Error::NotInitialized(storage.root().to_path_buf()));
    }
    let store = FileStore::open(storage.clone())
        .map_err(|source| Error::store("open store", source))?;
    Ok(Context {
        config,
        storage,
        store,
    })
}

/// Which end of a calendar day a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayBound {
    Start,
    End,
}

/// Parse an RFC 3339 timestamp, or a `YYYY-MM-DD` date taken as UTC.
fn parse_instant(flag: &str, raw: &str, bound: DayBound) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!(
            "{flag} expects an RFC 3339 timestamp or YYYY-MM-DD date, got '{raw}'"
        ))
    })?;
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| Error::InvalidArgument(format!("{flag}: invalid end of day")))?,
    };
    Ok(date.and_time(time).and_utc())
}

fn resolve_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        Some(raw) => parse_instant("--now", raw, DayBound::Start),
        None => Ok(Utc::now()),
    }
}

fn resolve_days(days: Option<u32>, default: u32) -> Result<u32> {
    match days {
        Some(0) => Err(Error::InvalidArgument("--days must be >= 1".to_string())),
        Some(days) => Ok(days),
        None => Ok(default),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_instant_accepts_rfc3339() {
        let at = parse_instant("--now", "2026-06-01T12:00:00+02:00", DayBound::Start)
            .expect("parse");
        assert_eq!(
            at,
            Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0)
                .single()
                .expect("valid date")
        );
    }

    #[test]
    fn parse_instant_expands_bare_dates() {
        let start = parse_instant("--from", "2026-03-04", DayBound::Start).expect("start");
        let end = parse_instant("--to", "2026-03-04", DayBound::End).expect("end");
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0)
                .single()
                .expect("valid date")
        );
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");
        assert!(end > start);
    }

    #[test]
    fn parse_instant_rejects_garbage() {
        let err = parse_instant("--from", "last tuesday", DayBound::Start).expect_err("garbage");
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("--from")));
    }

    #[test]
    fn resolve_days_rejects_zero() {
        assert!(resolve_days(Some(0), 7).is_err());
        assert_eq!(resolve_days(None, 7).expect("default"), 7);
        assert_eq!(resolve_days(Some(30), 7).expect("explicit"), 30);
    }
}
