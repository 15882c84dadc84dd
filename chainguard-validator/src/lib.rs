//! Syntax validator multiplexer (§4.6): dispatch by file extension to an
//! external tool with a configurable timeout. A missing tool yields `Skip`,
//! never a failure.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    pub checked: String,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn valid(lang: &str) -> Self {
        Self { outcome: ValidationOutcome::Valid, checked: lang.to_string(), errors: vec![] }
    }

    fn invalid(lang: &str, errors: Vec<String>) -> Self {
        Self { outcome: ValidationOutcome::Invalid, checked: lang.to_string(), errors }
    }

    fn skip(lang: &str, reason: &str) -> Self {
        Self { outcome: ValidationOutcome::Skipped, checked: lang.to_string(), errors: vec![reason.to_string()] }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, ValidationOutcome::Valid | ValidationOutcome::Skipped)
    }
}

struct Rule {
    lang: &'static str,
    tool: &'static str,
    args: &'static [&'static str],
    /// Extracts the first diagnostic line from stderr/stdout.
    extract: fn(&str) -> Vec<String>,
}

fn first_line_containing<'a>(text: &'a str, needle: &str) -> Vec<String> {
    text.lines()
        .find(|line| line.contains(needle))
        .map(|line| vec![line.trim().to_string()])
        .unwrap_or_else(|| vec![text.lines().next().unwrap_or("unknown error").trim().to_string()])
}

fn php_extract(text: &str) -> Vec<String> {
    first_line_containing(text, "Parse error")
}

fn node_extract(text: &str) -> Vec<String> {
    first_line_containing(text, "SyntaxError")
}

fn py_extract(text: &str) -> Vec<String> {
    first_line_containing(text, "SyntaxError")
}

fn ts_extract(text: &str) -> Vec<String> {
    first_line_containing(text, "error TS")
}

const RULES: &[Rule] = &[
    Rule { lang: "php", tool: "php", args: &["-l"], extract: php_extract },
    Rule { lang: "javascript", tool: "node", args: &["--check"], extract: node_extract },
    Rule { lang: "python", tool: "python3", args: &["-m", "py_compile"], extract: py_extract },
    Rule { lang: "typescript", tool: "npx", args: &["tsc", "--noEmit"], extract: ts_extract },
];

fn rule_for_extension(ext: &str) -> Option<&'static Rule> {
    match ext {
        "php" => RULES.iter().find(|r| r.lang == "php"),
        "js" | "mjs" | "cjs" => RULES.iter().find(|r| r.lang == "javascript"),
        "py" => RULES.iter().find(|r| r.lang == "python"),
        "ts" | "tsx" => RULES.iter().find(|r| r.lang == "typescript"),
        _ => None,
    }
}

/// Validates `path`'s existing contents against the rule its extension
/// selects. `.json` is parsed in-process; every other extension shells out
/// under `timeout`. Unrecognized extensions are skipped.
pub async fn validate(path: &Path, timeout: Duration) -> ValidationReport {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return ValidationReport::skip("unknown", "no file extension");
    };

    if ext == "json" {
        return validate_json(path).await;
    }

    let Some(rule) = rule_for_extension(ext) else {
        return ValidationReport::skip(ext, "no validator registered for this extension");
    };

    if which::which(rule.tool).is_err() {
        return ValidationReport::skip(rule.lang, &format!("`{}` not found on PATH", rule.tool));
    }

    let mut command = tokio::process::Command::new(rule.tool);
    command.args(rule.args);
    command.arg(path);
    command.kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) if output.status.success() => ValidationReport::valid(rule.lang),
        Ok(Ok(output)) => {
            let combined = format!(
                "{}\n{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
            ValidationReport::invalid(rule.lang, (rule.extract)(&combined))
        }
        Ok(Err(err)) => ValidationReport::skip(rule.lang, &format!("failed to spawn `{}`: {err}", rule.tool)),
        Err(_) => ValidationReport::invalid(rule.lang, vec![format!("timed out after {timeout:?}")]),
    }
}

async fn validate_json(path: &Path) -> ValidationReport {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(_) => ValidationReport::valid("json"),
            Err(err) => ValidationReport::invalid("json", vec![err.to_string()]),
        },
        Err(err) => ValidationReport::skip("json", &format!("could not read file: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn valid_json_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        tokio::fs::write(&path, b"{\"a\":1}").await.unwrap();
        let report = validate(&path, DEFAULT_TIMEOUT).await;
        assert_eq!(report.outcome, ValidationOutcome::Valid);
    }

    #[tokio::test]
    async fn invalid_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let report = validate(&path, DEFAULT_TIMEOUT).await;
        assert_eq!(report.outcome, ValidationOutcome::Invalid);
        assert!(!report.errors.is_empty());
    }

    #[tokio::test]
    async fn unknown_extension_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xyz");
        tokio::fs::write(&path, b"whatever").await.unwrap();
        let report = validate(&path, DEFAULT_TIMEOUT).await;
        assert_eq!(report.outcome, ValidationOutcome::Skipped);
        assert!(report.is_valid());
    }
}
