//! The data model (§3): `ProjectState` and the types it is built from.

mod alert;
mod kanban;
mod phase;
mod project_state;
mod scope;
mod task_mode;
mod test_types;

pub use alert::{Alert, AlertSeverity};
pub use kanban::{KanbanBoard, KanbanCard, KanbanColumn, KanbanHistoryEntry};
pub use phase::Phase;
pub use project_state::ProjectState;
pub use scope::{ChecklistItem, ScopeDefinition};
pub use task_mode::{ModeFeatures, TaskMode};
pub use test_types::{TestConfig, TestResult};
