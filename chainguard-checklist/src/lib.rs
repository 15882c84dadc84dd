//! Whitelisted-command checklist runner (§4.11). Each scope checklist item
//! pairs a human label with a shell-like check command; the runner
//! tokenizes it with `shlex` and executes the argv directly — never a
//! shell — against a fixed command whitelist.

use std::time::Duration;

use thiserror::Error;

/// Commands a checklist `check` is allowed to invoke. Anything else is
/// rejected before a process is ever spawned.
pub const WHITELIST: &[&str] = &[
    "test", "grep", "ls", "cat", "head", "wc", "find", "stat", "[", "php", "node", "python",
    "python3", "npm", "composer",
];

pub const ITEM_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error("empty check command")]
    Empty,
    #[error("unparsable check command: {0}")]
    Unparsable(String),
    #[error("command `{0}` is not in the checklist whitelist")]
    NotWhitelisted(String),
}

#[derive(Debug, Clone)]
pub struct ChecklistItem {
    pub item: String,
    pub check: String,
}

#[derive(Debug, Clone)]
pub struct ChecklistResult {
    pub item: String,
    pub passed: bool,
    pub detail: String,
}

/// Tokenizes `check` and verifies its head is whitelisted, without running
/// anything. Exposed separately so `set_scope` can validate a checklist at
/// declaration time instead of at first run.
pub fn validate_command(check: &str) -> Result<Vec<String>, ChecklistError> {
    let tokens = shlex::split(check).ok_or_else(|| ChecklistError::Unparsable(check.to_string()))?;
    let head = tokens.first().ok_or(ChecklistError::Empty)?;
    if !WHITELIST.contains(&head.as_str()) {
        return Err(ChecklistError::NotWhitelisted(head.clone()));
    }
    Ok(tokens)
}

async fn run_one(item: &ChecklistItem) -> ChecklistResult {
    let argv = match validate_command(&item.check) {
        Ok(argv) => argv,
        Err(err) => {
            return ChecklistResult { item: item.item.clone(), passed: false, detail: err.to_string() };
        }
    };

    let mut command = tokio::process::Command::new(&argv[0]);
    command.args(&argv[1..]);
    command.kill_on_drop(true);

    let run = tokio::time::timeout(ITEM_TIMEOUT, command.output()).await;
    match run {
        Ok(Ok(output)) => ChecklistResult {
            item: item.item.clone(),
            passed: output.status.success(),
            detail: if output.status.success() {
                "ok".to_string()
            } else {
                String::from_utf8_lossy(&output.stderr).trim().to_string()
            },
        },
        Ok(Err(err)) => ChecklistResult {
            item: item.item.clone(),
            passed: false,
            detail: format!("failed to spawn: {err}"),
        },
        Err(_) => ChecklistResult {
            item: item.item.clone(),
            passed: false,
            detail: format!("timed out after {ITEM_TIMEOUT:?}"),
        },
    }
}

/// Runs every item concurrently (§4.11).
pub async fn run_all_async(items: &[ChecklistItem]) -> Vec<ChecklistResult> {
    futures::future::join_all(items.iter().map(run_one)).await
}

/// Sync facade for non-async call sites: drives `run_all_async` on a
/// dedicated single-threaded runtime.
pub fn run_all(items: &[ChecklistItem]) -> Vec<ChecklistResult> {
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt.block_on(run_all_async(items)),
        Err(err) => items
            .iter()
            .map(|item| ChecklistResult {
                item: item.item.clone(),
                passed: false,
                detail: format!("could not start checklist runtime: {err}"),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_whitelisted_command() {
        let err = validate_command("rm -rf /").unwrap_err();
        assert!(matches!(err, ChecklistError::NotWhitelisted(_)));
    }

    #[test]
    fn accepts_whitelisted_command_with_quoted_args() {
        let tokens = validate_command("grep \"hello world\" file.txt").unwrap();
        assert_eq!(tokens, vec!["grep", "hello world", "file.txt"]);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(validate_command("   ").unwrap_err(), ChecklistError::Empty));
    }

    #[tokio::test]
    async fn run_all_async_executes_whitelisted_items() {
        let items = vec![ChecklistItem { item: "list root".into(), check: "ls /".into() }];
        let results = run_all_async(&items).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].passed);
    }

    #[tokio::test]
    async fn run_all_async_reports_whitelist_rejection_without_spawning() {
        let items = vec![ChecklistItem { item: "danger".into(), check: "curl evil.example".into() }];
        let results = run_all_async(&items).await;
        assert!(!results[0].passed);
        assert!(results[0].detail.contains("whitelist"));
    }
}
