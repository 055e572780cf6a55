//! Shared output formatting for taskdeck CLI commands.

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "taskdeck.v1";

/// Top-level commands that take a subcommand.
const GROUPS: [&str; 4] = ["task", "member", "team", "notification"];

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    data: &'a T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = ErrorEnvelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Error::Validation(errors) = err {
        for (field, message) in errors.fields() {
            eprintln!("  {field}: {message}");
        }
    }
    if let Error::MarkReadIncomplete(report) = err {
        for failure in &report.failed {
            eprintln!("  {}: {}", failure.id, failure.message);
        }
    }
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// Best-effort command name for error envelopes, read from the raw args.
pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

fn command_name_from(args: impl IntoIterator<Item = String>) -> String {
    let mut positional = args.into_iter().filter(|arg| !arg.starts_with('-'));
    let Some(command) = positional.next() else {
        return "taskdeck".to_string();
    };
    if GROUPS.contains(&command.as_str()) {
        if let Some(sub) = positional.next() {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        exit_codes::USER_ERROR => "user_error",
        exit_codes::REMOTE_REJECTED => "remote_rejected",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotAuthenticated => vec!["taskdeck login --email <email>".to_string()],
        Error::Http { status: 401, .. } | Error::Http { status: 403, .. } => {
            vec!["taskdeck login --email <email>".to_string()]
        }
        Error::InvalidConfig(_) => vec!["fix taskdeck.toml then retry".to_string()],
        Error::Transport(_) => vec!["check --api-url and your network connection".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{MarkReadFailure, MarkReadReport};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_name_includes_group_subcommand() {
        assert_eq!(command_name_from(args(&["--json", "team", "create"])), "team create");
        assert_eq!(command_name_from(args(&["login", "--email"])), "login");
        assert_eq!(command_name_from(args(&[])), "taskdeck");
    }

    #[test]
    fn human_output_sections() {
        let mut out = HumanOutput::new("Teams");
        out.push_summary("count", "1");
        out.push_detail("t1  Core");
        out.push_next_step("taskdeck team create --name <name>");
        let text = format_human(&out);
        assert!(text.starts_with("Teams\n\nSummary:\n- count: 1"));
        assert!(text.contains("Details:\n- t1  Core"));
        assert!(text.ends_with("Next steps:\n- taskdeck team create --name <name>"));
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(error_kind(&Error::NotAuthenticated), "user_error");
        assert_eq!(
            error_kind(&Error::Http {
                status: 409,
                message: "exists".to_string()
            }),
            "remote_rejected"
        );
        assert_eq!(error_kind(&Error::Channel("x".to_string())), "operation_failed");
        assert_eq!(error_next_steps(&Error::NotAuthenticated).len(), 1);
    }

    #[test]
    fn incomplete_mark_read_keeps_report_in_details() {
        let err = Error::MarkReadIncomplete(MarkReadReport {
            confirmed: vec!["n1".to_string(), "n3".to_string()],
            failed: vec![MarkReadFailure {
                id: "n2".to_string(),
                message: "Could not update task".to_string(),
            }],
        });

        assert_eq!(err.to_string(), "1 of 3 notification(s) could not be marked read");
        assert_eq!(error_kind(&err), "operation_failed");
        let details = err.details().expect("details");
        assert_eq!(details["confirmed"], serde_json::json!(["n1", "n3"]));
        assert_eq!(details["failed"][0]["id"], "n2");
        assert_eq!(details["failed"][0]["message"], "Could not update task");
    }
}
