use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chainguard_common::{BoundedSet, Ring};
use crate::history::{ErrorIndex, HistoryEntry};

use super::{Alert, KanbanBoard, Phase, ScopeDefinition, TaskMode, TestConfig, TestResult};

/// One project's complete persisted state (§3), keyed externally by
/// `project_id` (the map key lives in `ProjectManager`, not in this struct).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub project_id: String,
    pub project_name: String,
    pub project_path: String,

    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub current_task: String,

    #[serde(default)]
    pub files_changed: u64,
    #[serde(default)]
    pub files_since_validation: u64,
    #[serde(default)]
    pub validations_passed: u64,
    #[serde(default)]
    pub validations_failed: u64,
    #[serde(default)]
    pub tests_passed: u64,
    #[serde(default)]
    pub tests_failed: u64,
    #[serde(default)]
    pub http_tests_performed: u64,

    pub last_validation: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub session_start: DateTime<Utc>,
    pub db_schema_checked_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub scope: Option<ScopeDefinition>,
    #[serde(default)]
    pub mode: TaskMode,

    #[serde(default)]
    pub criteria_status: HashMap<String, bool>,
    #[serde(default)]
    pub checklist_results: HashMap<String, bool>,
    #[serde(default)]
    pub alerts: Vec<Alert>,

    #[serde(default = "out_of_scope_set")]
    pub out_of_scope_files: BoundedSet<String>,
    #[serde(default = "changed_files_set")]
    pub changed_files: BoundedSet<String>,
    #[serde(default = "recent_actions_ring")]
    pub recent_actions: Ring<String>,

    #[serde(default)]
    pub http_base_url: Option<String>,
    #[serde(default)]
    pub http_credentials: Option<serde_json::Value>,
    #[serde(default)]
    pub kanban: KanbanBoard,

    #[serde(default)]
    pub test_config: Option<TestConfig>,
    #[serde(default)]
    pub test_results: Option<TestResult>,

    #[serde(default)]
    pub impact_check_pending: bool,

    // Mode-specific tracking (§4.3's `content`/`devops`/`research` extras).
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub chapters: Vec<String>,
    #[serde(default)]
    pub command_log: Vec<String>,
    #[serde(default)]
    pub checkpoints: Vec<String>,
    #[serde(default)]
    pub health_checks: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,

    /// Append-only event log (§4.7's `history.jsonl`, folded into
    /// `state.json` rather than a second file so a single debounced write
    /// keeps both consistent).
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default = "error_index")]
    pub error_index: ErrorIndex,
}

fn error_index() -> ErrorIndex {
    ErrorIndex::new(100)
}

fn out_of_scope_set() -> BoundedSet<String> {
    BoundedSet::new(20)
}

fn changed_files_set() -> BoundedSet<String> {
    BoundedSet::new(30)
}

fn recent_actions_ring() -> Ring<String> {
    Ring::new(5)
}

impl ProjectState {
    pub fn new(project_id: String, project_name: String, project_path: String, now: DateTime<Utc>) -> Self {
        Self {
            project_id,
            project_name,
            project_path,
            phase: Phase::default(),
            current_task: String::new(),
            files_changed: 0,
            files_since_validation: 0,
            validations_passed: 0,
            validations_failed: 0,
            tests_passed: 0,
            tests_failed: 0,
            http_tests_performed: 0,
            last_validation: None,
            last_activity: None,
            session_start: now,
            db_schema_checked_at: None,
            scope: None,
            mode: TaskMode::default(),
            criteria_status: HashMap::new(),
            checklist_results: HashMap::new(),
            alerts: Vec::new(),
            out_of_scope_files: out_of_scope_set(),
            changed_files: changed_files_set(),
            recent_actions: recent_actions_ring(),
            http_base_url: None,
            http_credentials: None,
            kanban: KanbanBoard::default(),
            test_config: None,
            test_results: None,
            impact_check_pending: false,
            word_count: 0,
            chapters: Vec::new(),
            command_log: Vec::new(),
            checkpoints: Vec::new(),
            health_checks: Vec::new(),
            sources: Vec::new(),
            facts: Vec::new(),
            history: Vec::new(),
            error_index: error_index(),
        }
    }

    /// I3: `finish` is blocked while any blocking alert is unacknowledged.
    pub fn has_unacknowledged_blocking_alert(&self) -> bool {
        self.alerts.iter().any(Alert::is_blocking)
    }

    /// I1 invariant check, used by tests and by handlers after each mutation.
    pub fn invariant_files_since_validation_holds(&self) -> bool {
        self.files_since_validation <= self.files_changed
    }

    pub fn note_activity(&mut self, now: DateTime<Utc>) {
        self.last_activity = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn new_state_has_unknown_phase_and_programming_mode() {
        let state = ProjectState::new("abc123".into(), "demo".into(), "/tmp/demo".into(), now());
        assert_eq!(state.phase, Phase::Unknown);
        assert_eq!(state.mode, TaskMode::Programming);
        assert!(!state.has_unacknowledged_blocking_alert());
    }

    #[test]
    fn invariant_holds_on_fresh_state() {
        let state = ProjectState::new("abc123".into(), "demo".into(), "/tmp/demo".into(), now());
        assert!(state.invariant_files_since_validation_holds());
    }

    #[test]
    fn round_trips_through_json() {
        let state = ProjectState::new("abc123".into(), "demo".into(), "/tmp/demo".into(), now());
        let json = serde_json::to_string(&state).unwrap();
        let back: ProjectState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.project_id, "abc123");
    }
}
