//! Pre-action enforcement hook (§6). Invoked by the host once per
//! file-writing tool call, entirely independent of `chainguard-server` — it
//! shares no process state, only the on-disk enforcement snapshot and the
//! `chainguard-git` project-identity derivation.
//!
//! Deliberately synchronous: a hook fires on a host's hot path before every
//! file write, and a tokio runtime would be pure overhead for one JSON read
//! and one small file read.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use chainguard_core::{EnforcementSnapshot, Settings};
use chainguard_git::derive_project_identity;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HookInput {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: ToolInput,
    #[serde(default)]
    cwd: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolInput {
    file_path: Option<String>,
}

fn main() -> ExitCode {
    let raw = match read_input() {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("chainguard-hook: {err}");
            return ExitCode::SUCCESS;
        }
    };

    let input: HookInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(err) => {
            eprintln!("chainguard-hook: malformed input: {err}");
            return ExitCode::SUCCESS;
        }
    };

    run(&input)
}

/// Reads the hook's single JSON argument from argv[1] if present, else
/// stdin, to fit differing host invocation conventions.
fn read_input() -> std::io::Result<String> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn run(input: &HookInput) -> ExitCode {
    let Some(file_path) = input.tool_input.file_path.as_deref() else {
        // Nothing file-writing to gate; let it through.
        return ExitCode::SUCCESS;
    };

    let start_dir = input
        .cwd
        .as_deref()
        .map(Path::new)
        .unwrap_or_else(|| Path::new(file_path))
        .to_path_buf();
    let project_root = chainguard_git::find_project_root(&start_dir);
    let identity = derive_project_identity(&project_root);

    let settings = Settings::load();
    let snapshot_path = settings.project_dir(&identity.project_id).join("enforcement-state.json");

    let snapshot = match std::fs::read_to_string(&snapshot_path) {
        Ok(raw) => match serde_json::from_str::<EnforcementSnapshot>(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                eprintln!("chainguard-hook: snapshot unreadable, allowing: {err}");
                return ExitCode::SUCCESS;
            }
        },
        Err(_) => {
            // No snapshot yet means no project has been tracked under
            // chainguard-server's management; nothing to enforce.
            return ExitCode::SUCCESS;
        }
    };

    if !snapshot.blocking_alerts.is_empty() {
        println!(
            "BLOCKED: {} unresolved blocking alert(s): {}",
            snapshot.blocking_alerts.len(),
            snapshot.blocking_alerts.iter().map(|a| a.message.as_str()).collect::<Vec<_>>().join("; ")
        );
        return ExitCode::from(2);
    }

    if settings.matches_schema_pattern(file_path) && schema_check_stale(&snapshot, &settings) {
        println!(
            "SCHEMA STALE: {} touches a schema-affecting file but the database schema has not \
             been inspected within the last {}s. Call db_schema before editing.",
            tool_label(&input.tool_name),
            settings.db_schema_check_ttl.as_secs()
        );
        return ExitCode::from(2);
    }

    ExitCode::SUCCESS
}

fn tool_label(tool_name: &str) -> &str {
    if tool_name.is_empty() {
        "this tool call"
    } else {
        tool_name
    }
}

fn schema_check_stale(snapshot: &EnforcementSnapshot, settings: &Settings) -> bool {
    match snapshot.db_schema_checked_at {
        None => true,
        Some(checked_at) => {
            let age = chrono::Utc::now().signed_duration_since(checked_at);
            match age.to_std() {
                Ok(age) => age > settings.db_schema_check_ttl,
                Err(_) => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_path_allows() {
        let input = HookInput { tool_name: "Read".into(), tool_input: ToolInput::default(), cwd: None };
        assert_eq!(run(&input), ExitCode::SUCCESS);
    }

    #[test]
    fn missing_snapshot_allows() {
        let tmp = tempfile::tempdir().unwrap();
        let input = HookInput {
            tool_name: "Write".into(),
            tool_input: ToolInput { file_path: Some(tmp.path().join("app.rs").to_string_lossy().into_owned()) },
            cwd: Some(tmp.path().to_string_lossy().into_owned()),
        };
        assert_eq!(run(&input), ExitCode::SUCCESS);
    }

    #[test]
    fn schema_check_stale_treats_missing_timestamp_as_stale() {
        let settings = Settings::load();
        let snapshot = EnforcementSnapshot {
            project_id: "abc".into(),
            has_scope: true,
            mode: chainguard_core::model::TaskMode::Programming,
            db_schema_checked_at: None,
            http_tests_performed: 0,
            blocking_alerts: Vec::new(),
            phase: chainguard_core::model::Phase::Implementation,
            updated_at: chrono::Utc::now(),
        };
        assert!(schema_check_stale(&snapshot, &settings));
    }

    #[test]
    fn schema_check_stale_false_when_recent() {
        let settings = Settings::load();
        let snapshot = EnforcementSnapshot {
            project_id: "abc".into(),
            has_scope: true,
            mode: chainguard_core::model::TaskMode::Programming,
            db_schema_checked_at: Some(chrono::Utc::now()),
            http_tests_performed: 0,
            blocking_alerts: Vec::new(),
            phase: chainguard_core::model::Phase::Implementation,
            updated_at: chrono::Utc::now(),
        };
        assert!(!schema_check_stale(&snapshot, &settings));
    }
}
