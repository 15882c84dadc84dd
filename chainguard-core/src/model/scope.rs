use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: String,
    pub check: String,
}

/// The active task declaration gating almost every tool (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeDefinition {
    pub description: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    pub created_at: DateTime<Utc>,
}

impl ScopeDefinition {
    pub const MAX_DESCRIPTION_CHARS: usize = 500;

    /// Truncates `description` to the configured cap, returning whether a
    /// truncation warning should be surfaced to the caller.
    pub fn new(
        description: String,
        modules: Vec<String>,
        acceptance_criteria: Vec<String>,
        checklist: Vec<ChecklistItem>,
        created_at: DateTime<Utc>,
    ) -> (Self, bool) {
        let truncated = description.chars().count() > Self::MAX_DESCRIPTION_CHARS;
        let description = if truncated {
            description.chars().take(Self::MAX_DESCRIPTION_CHARS).collect()
        } else {
            description
        };
        (Self { description, modules, acceptance_criteria, checklist, created_at }, truncated)
    }

    /// Glob-style membership test against `modules` (§4.4 step 4).
    pub fn contains_path(&self, path: &str) -> bool {
        if self.modules.is_empty() {
            return true;
        }
        self.modules
            .iter()
            .any(|pattern| wildmatch::WildMatch::new(pattern).matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_overlong_description() {
        let long = "x".repeat(600);
        let (scope, truncated) =
            ScopeDefinition::new(long, vec![], vec![], vec![], Utc::now());
        assert!(truncated);
        assert_eq!(scope.description.chars().count(), 500);
    }

    #[test]
    fn empty_modules_means_everything_in_scope() {
        let (scope, _) = ScopeDefinition::new("x".into(), vec![], vec![], vec![], Utc::now());
        assert!(scope.contains_path("src/anything.rs"));
    }

    #[test]
    fn glob_membership() {
        let (scope, _) =
            ScopeDefinition::new("x".into(), vec!["src/*.rs".into()], vec![], vec![], Utc::now());
        assert!(scope.contains_path("src/lib.rs"));
        assert!(!scope.contains_path("tests/lib.rs"));
    }
}
