use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warn,
    Blocking,
}

/// One entry in `ProjectState::alerts` (§3). A `Blocking`, unacknowledged
/// alert is the one condition `finish` can never override (§4.5 gate 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub message: String,
    pub severity: AlertSeverity,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(message: impl Into<String>, severity: AlertSeverity, created_at: DateTime<Utc>) -> Self {
        Self { message: message.into(), severity, created_at, acknowledged: false }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.severity, AlertSeverity::Blocking) && !self.acknowledged
    }
}
