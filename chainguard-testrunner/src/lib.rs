//! Test runner (§4.10): runs a project's configured test command as a
//! subprocess and parses its output with a small regex-per-framework table
//! to fill in `TestResult`.

use std::time::Duration;

use regex_lite::Regex;
use thiserror::Error;

use chainguard_core::model::{TestConfig, TestResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum TestRunnerError {
    #[error("no test command configured")]
    NoCommand,
    #[error("failed to spawn test command: {0}")]
    Spawn(String),
    #[error("test command timed out after {0:?}")]
    Timeout(Duration),
}

struct FrameworkRule {
    name: &'static str,
    pattern: &'static str,
}

const FRAMEWORK_RULES: &[FrameworkRule] = &[
    FrameworkRule { name: "phpunit", pattern: r"OK \((\d+) tests?," },
    FrameworkRule { name: "phpunit", pattern: r"Tests:\s*(\d+),\s*Assertions:" },
    FrameworkRule { name: "jest", pattern: r"Tests:\s*(\d+) passed" },
    FrameworkRule { name: "pytest", pattern: r"(\d+) passed" },
    FrameworkRule { name: "mocha", pattern: r"(\d+) passing" },
    FrameworkRule { name: "vitest", pattern: r"Tests\s+(\d+) passed" },
];

const FAILURE_PATTERNS: &[(&str, &str)] = &[
    ("phpunit", r"Tests:\s*\d+,.*Failures:\s*(\d+)"),
    ("jest", r"Tests:.*?(\d+) failed"),
    ("pytest", r"(\d+) failed"),
    ("mocha", r"(\d+) failing"),
    ("vitest", r"Tests.*?(\d+) failed"),
];

fn detect(output: &str) -> (Option<&'static str>, u32, u32) {
    for rule in FRAMEWORK_RULES {
        let Ok(re) = Regex::new(rule.pattern) else { continue };
        let Some(caps) = re.captures(output) else { continue };
        let passed: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let failed = FAILURE_PATTERNS
            .iter()
            .find(|(name, _)| *name == rule.name)
            .and_then(|(_, pattern)| Regex::new(pattern).ok())
            .and_then(|re| re.captures(output))
            .and_then(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()))
            .unwrap_or(0);
        return (Some(rule.name), passed, failed);
    }
    (None, 0, 0)
}

/// Runs `config.command` with `config.args`, parsing its combined output
/// for a recognized framework's pass/fail summary.
pub async fn run_tests(config: &TestConfig) -> Result<TestResult, TestRunnerError> {
    if config.command.trim().is_empty() {
        return Err(TestRunnerError::NoCommand);
    }

    let timeout = config.timeout_secs.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT);

    let mut command = tokio::process::Command::new(&config.command);
    command.args(&config.args);
    if let Some(dir) = &config.working_dir {
        command.current_dir(dir);
    }
    command.kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| TestRunnerError::Timeout(timeout))?
        .map_err(|e| TestRunnerError::Spawn(e.to_string()))?;

    let combined = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let (framework, passed, failed) = detect(&combined);
    let success = output.status.success() && failed == 0;

    Ok(TestResult {
        success,
        passed,
        failed,
        framework: framework.map(str::to_string),
        summary: combined.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pytest_pass_and_fail_counts() {
        let (framework, passed, failed) = detect("5 passed, 2 failed in 1.23s");
        assert_eq!(framework, Some("pytest"));
        assert_eq!(passed, 5);
        assert_eq!(failed, 2);
    }

    #[test]
    fn detects_mocha_output() {
        let (framework, passed, _) = detect("  12 passing (45ms)");
        assert_eq!(framework, Some("mocha"));
        assert_eq!(passed, 12);
    }

    #[test]
    fn unrecognized_output_has_no_framework() {
        let (framework, passed, failed) = detect("some random build log");
        assert_eq!(framework, None);
        assert_eq!(passed, 0);
        assert_eq!(failed, 0);
    }

    #[tokio::test]
    async fn empty_command_errors_without_spawning() {
        let config = TestConfig { command: "".into(), args: vec![], timeout_secs: None, working_dir: None };
        let err = run_tests(&config).await.unwrap_err();
        assert!(matches!(err, TestRunnerError::NoCommand));
    }

    #[tokio::test]
    async fn runs_a_real_command_and_reports_success() {
        let config =
            TestConfig { command: "true".into(), args: vec![], timeout_secs: None, working_dir: None };
        let result = run_tests(&config).await.unwrap();
        assert!(result.success);
    }
}
