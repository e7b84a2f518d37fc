//! Error types for taskkeep
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, invalid configuration, missing store)
//! - 4: Operation failed (store error, housekeeping phase aborted)

use thiserror::Error;

use crate::housekeeping::{HousekeepingStats, Phase};
use crate::model::TaskId;
use crate::store::StoreError;

/// Exit codes for the taskkeep CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskkeep operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No taskkeep store at {0}")]
    NotInitialized(std::path::PathBuf),

    // Operation failures (exit code 4)
    /// A housekeeping phase aborted. `committed` holds what earlier phases
    /// already saved before the failure.
    #[error("housekeeping {phase} phase failed during {operation}: {source}")]
    Housekeeping {
        phase: Phase,
        operation: String,
        committed: HousekeepingStats,
        #[source]
        source: StoreError,
    },

    /// A housekeeping phase met a record it cannot process. `committed` as
    /// for [`Error::Housekeeping`].
    #[error("housekeeping {phase} phase rejected a record: {source}")]
    PhaseRejected {
        phase: Phase,
        committed: HousekeepingStats,
        #[source]
        source: Box<Error>,
    },

    #[error("Store operation failed during {operation}: {source}")]
    Store {
        operation: String,
        #[source]
        source: StoreError,
    },

    #[error("Task {task_id} cannot be archived: missing {field}")]
    IncompleteTask { task_id: TaskId, field: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::NotInitialized(_) => {
                exit_codes::USER_ERROR
            }

            Error::Housekeeping { .. }
            | Error::PhaseRejected { .. }
            | Error::Store { .. }
            | Error::IncompleteTask { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Wrap a store failure with a description of what was being attempted.
    pub fn store(operation: impl Into<String>, source: StoreError) -> Self {
        Error::Store {
            operation: operation.into(),
            source,
        }
    }

    /// Structured details for JSON error output, when the variant has any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Housekeeping {
                phase,
                operation,
                committed,
                ..
            } => Some(serde_json::json!({
                "phase": phase.as_str(),
                "operation": operation,
                "committed": committed,
            })),
            Error::PhaseRejected {
                phase,
                committed,
                source,
            } => Some(serde_json::json!({
                "phase": phase.as_str(),
                "committed": committed,
                "rejected": source.details(),
            })),
            Error::Store { operation, .. } => Some(serde_json::json!({ "operation": operation })),
            Error::IncompleteTask { task_id, field } => Some(serde_json::json!({
                "task_id": task_id,
                "field": field,
            })),
            _ => None,
        }
    }
}

/// Result type alias for taskkeep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
