//! The minimal snapshot `chainguard-hook` reads (§4.1). Written
//! synchronously after every save, debounced or immediate, so the hook
//! never shares in-process state with the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Phase, ProjectState, TaskMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingAlertSummary {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnforcementSnapshot {
    pub project_id: String,
    pub has_scope: bool,
    pub mode: TaskMode,
    pub db_schema_checked_at: Option<DateTime<Utc>>,
    pub http_tests_performed: u64,
    pub blocking_alerts: Vec<BlockingAlertSummary>,
    pub phase: Phase,
    pub updated_at: DateTime<Utc>,
}

impl EnforcementSnapshot {
    pub fn from_state(project_id: &str, state: &ProjectState) -> Self {
        Self {
            project_id: project_id.to_string(),
            has_scope: state.scope.is_some(),
            mode: state.mode,
            db_schema_checked_at: state.db_schema_checked_at,
            http_tests_performed: state.http_tests_performed,
            blocking_alerts: state
                .alerts
                .iter()
                .filter(|a| a.is_blocking())
                .map(|a| BlockingAlertSummary { message: a.message.clone() })
                .collect(),
            phase: state.phase,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alert, AlertSeverity};

    #[test]
    fn carries_only_blocking_unacknowledged_alerts() {
        let mut state = ProjectState::new("id".into(), "name".into(), "/tmp".into(), Utc::now());
        state.alerts.push(Alert::new("warn me", AlertSeverity::Warn, Utc::now()));
        state.alerts.push(Alert::new("blocked", AlertSeverity::Blocking, Utc::now()));

        let snapshot = EnforcementSnapshot::from_state("id", &state);
        assert_eq!(snapshot.blocking_alerts.len(), 1);
        assert_eq!(snapshot.blocking_alerts[0].message, "blocked");
    }
}
