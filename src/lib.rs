//! taskkeep - Tiered retention for completed tasks
//!
//! This library implements the housekeeping engine behind a task tracker:
//! completed tasks stay fully live for a while, are then flattened into
//! immutable log entries, and are finally purged.
//!
//! # Core Concepts
//!
//! - **Tiers**: Active (<= 90 days), Archive (91..=365 days), Purge (366+)
//! - **Root tasks**: only tasks without a parent are evaluated; subtasks move
//!   with their root
//! - **Log entries**: denormalized snapshots holding copied values only
//! - **Housekeeping**: archive, purge, then prune, one save per phase
//!
//! # Module Organization
//!
//! - `model`: Live task, tag and attachment records
//! - `snapshot`: Immutable archived log entries
//! - `retention`: Tier classification by completion age
//! - `archive`: Task tree loading and flattening into log entries
//! - `housekeeping`: The three-phase batch job and its statistics
//! - `query`: Recent, archived and search queries over completions
//! - `store`: Store trait with in-memory and file-backed implementations
//! - `storage`: On-disk layout and atomic JSON writes
//! - `lock`: File locking for store saves
//! - `config`: Configuration loading from `.taskkeep.toml`
//! - `error`: Error types and result aliases
//! - `output`: Human and JSON output for the CLI
//! - `cli`: Command-line interface using clap

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod housekeeping;
pub mod lock;
pub mod model;
pub mod output;
pub mod query;
pub mod retention;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
pub use housekeeping::{perform_housekeeping, Housekeeper, HousekeepingStats};
pub use retention::{RetentionPolicy, Tier};
pub use snapshot::TaskLogEntry;
pub use store::{FileStore, MemoryStore, Store};
