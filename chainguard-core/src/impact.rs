//! Code/impact analyzer (§4.12): pattern-based hints over the set of
//! changed files, used both by `analyze` and by the first phase of
//! `finish`'s completion gate (§4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactHint {
    pub file: String,
    pub hint: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactReport {
    pub hints: Vec<ImpactHint>,
    pub web_relevant: bool,
}

/// Name-pattern → suggestion table (§4.5). Order matters: the first
/// matching pattern wins for a given file.
const PATTERNS: &[(&str, &str)] = &[
    ("controller", "Controller changed — add or update its test suite."),
    ("migration", "Migration changed — check model definitions stay in sync."),
    ("migrate", "Migration changed — check model definitions stay in sync."),
    ("model", "Model changed — verify controllers and serializers still match its shape."),
    ("route", "Routing changed — confirm no endpoints were orphaned."),
    ("middleware", "Middleware changed — re-check auth and request-logging paths."),
    ("schema", "Schema changed — inspect the live database before finishing."),
    ("test", "Test file changed — run the suite before finishing."),
];

const WEB_PATTERNS: &[&str] =
    &["controller", "route", "view", "endpoint", "api", "middleware"];

pub fn analyze(changed_files: &[String]) -> ImpactReport {
    let mut hints = Vec::new();
    let mut web_relevant = false;

    for file in changed_files {
        let lower = file.to_lowercase();
        if let Some((_, suggestion)) = PATTERNS.iter().find(|(pattern, _)| lower.contains(pattern)) {
            hints.push(ImpactHint { file: file.clone(), hint: suggestion.to_string() });
        }
        if WEB_PATTERNS.iter().any(|p| lower.contains(p)) {
            web_relevant = true;
        }
    }

    ImpactReport { hints, web_relevant }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_change_suggests_tests() {
        let report = analyze(&["app/Http/Controllers/UserController.php".to_string()]);
        assert_eq!(report.hints.len(), 1);
        assert!(report.hints[0].hint.contains("test suite"));
        assert!(report.web_relevant);
    }

    #[test]
    fn unrelated_file_produces_no_hint() {
        let report = analyze(&["README.md".to_string()]);
        assert!(report.hints.is_empty());
        assert!(!report.web_relevant);
    }

    #[test]
    fn migration_flags_model_sync() {
        let report = analyze(&["db/migrations/2026_add_users.sql".to_string()]);
        assert_eq!(report.hints.len(), 1);
        assert!(report.hints[0].hint.contains("Migration"));
    }
}
