//! Shared domain model and project-state management for the chainguard
//! workspace: `ProjectState` and its building blocks, the project manager
//! (bounded cache, debounced atomic persistence, enforcement snapshots),
//! the history/error index, the impact analyzer, and runtime configuration.

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod impact;
pub mod model;
pub mod project;

pub use config::Settings;
pub use error::{ChainguardError, Result};
pub use project::{EnforcementSnapshot, ProjectManager};
