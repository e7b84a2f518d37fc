//! Human and JSON rendering for taskkeep commands.
//!
//! JSON output is one envelope per invocation on stdout:
//! `{ schema_version, command, status, data | error, warnings?, hints? }`.
//! Human output goes to stdout on success and stderr on failure.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskkeep.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text rendering of a command result.
#[derive(Debug, Clone, Default)]
pub struct HumanReport {
    title: String,
    fields: Vec<(String, String)>,
    items: Vec<String>,
    warnings: Vec<String>,
    hints: Vec<String>,
}

impl HumanReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn field(&mut self, key: impl Into<String>, value: impl ToString) {
        self.fields.push((key.into(), value.to_string()));
    }

    pub fn item(&mut self, line: impl Into<String>) {
        self.items.push(line.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn hint(&mut self, command: impl Into<String>) {
        self.hints.push(command.into());
    }

    pub fn render(&self) -> String {
        let mut out = vec![self.title.clone()];
        out.extend(
            self.fields
                .iter()
                .map(|(key, value)| format!("  {key}: {value}")),
        );
        if !self.items.is_empty() {
            out.push(String::new());
            out.extend(self.items.iter().map(|item| format!("  - {item}")));
        }
        if !self.warnings.is_empty() || !self.hints.is_empty() {
            out.push(String::new());
        }
        out.extend(self.warnings.iter().map(|w| format!("warning: {w}")));
        out.extend(self.hints.iter().map(|h| format!("hint: {h}")));
        out.join("\n")
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hints: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: &HumanReport,
) -> Result<()> {
    if options.json {
        println!("{}", success_json(command, data, human)?);
    } else if !options.quiet {
        println!("{}", human.render());
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        println!("{}", error_json(command, err)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    for hint in error_hints(err) {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

fn success_json<T: Serialize>(command: &str, data: &T, human: &HumanReport) -> Result<String> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: Status::Success,
        data: Some(data),
        error: None,
        warnings: human.warnings.clone(),
        hints: human.hints.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

fn error_json(command: &str, err: &Error) -> Result<String> {
    let envelope: Envelope<'_, ()> = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: Status::Error,
        data: None,
        error: Some(ErrorBody {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        }),
        warnings: Vec::new(),
        hints: error_hints(err),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// First positional argument, skipping global flags and `--root`'s value.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--root" {
            args.next();
        } else if !arg.starts_with('-') {
            return arg;
        }
    }
    "taskkeep".to_string()
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        crate::error::exit_codes::USER_ERROR => "user_error",
        _ => "operation_failed",
    }
}

fn error_hints(err: &Error) -> Vec<String> {
    match err {
        Error::Housekeeping { .. } | Error::PhaseRejected { .. } => {
            vec!["taskkeep housekeep (phases that finished are already saved)".to_string()]
        }
        Error::InvalidConfig(_) => vec!["fix .taskkeep.toml and retry".to_string()],
        Error::NotInitialized(_) => vec!["taskkeep init".to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::housekeeping::{HousekeepingStats, Phase};
    use crate::store::StoreError;

    #[test]
    fn render_lists_fields_items_and_hints() {
        let mut report = HumanReport::new("taskkeep housekeep: dry run");
        report.field("tasks archived", 2);
        report.item("archive task a");
        report.warn("store is large");
        report.hint("taskkeep housekeep");

        assert_eq!(
            report.render(),
            "taskkeep housekeep: dry run\n  tasks archived: 2\n\n  - archive task a\n\nwarning: store is large\nhint: taskkeep housekeep"
        );
    }

    #[test]
    fn render_title_only() {
        assert_eq!(HumanReport::new("taskkeep status").render(), "taskkeep status");
    }

    #[test]
    fn success_envelope_carries_data() {
        let report = HumanReport::new("ignored");
        let json = success_json("status", &serde_json::json!({ "active": 3 }), &report)
            .expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["active"], 3);
        assert!(value.get("error").is_none());
        assert!(value.get("hints").is_none());
    }

    #[test]
    fn error_envelope_carries_phase_details() {
        let err = Error::Housekeeping {
            phase: Phase::Prune,
            operation: "save".to_string(),
            committed: HousekeepingStats {
                tasks_archived: 1,
                tasks_deleted: 0,
                logs_deleted: 0,
            },
            source: StoreError::Backend("offline".to_string()),
        };
        let value: serde_json::Value =
            serde_json::from_str(&error_json("housekeep", &err).expect("json")).expect("parse");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["kind"], "operation_failed");
        assert_eq!(value["error"]["details"]["phase"], "prune");
        assert!(value.get("data").is_none());
        assert_eq!(value["hints"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn command_name_skips_root_value() {
        let args = ["--root", "/tmp/x", "--json", "status"].map(String::from);
        assert_eq!(command_name(args), "status");
        assert_eq!(command_name(Vec::new()), "taskkeep");
    }
}
