//! The unified error enum propagated across tool handlers (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainguardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("path escapes project root: {0}")]
    PathUnsafe(String),

    #[error("no active scope; call set_scope first")]
    ScopeMissing,

    #[error("syntax check failed for {path}: {detail}")]
    SyntaxFail { path: String, detail: String },

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("I/O error: {0}")]
    IoFail(#[from] std::io::Error),

    #[error("subprocess failed: {0}")]
    SubprocessFail(String),

    #[error("database error: {0}")]
    DbFail(String),

    #[error("HTTP error: {0}")]
    HttpFail(String),

    #[error("authentication required: {0}")]
    AuthRequired(String),

    #[error("project snapshot is stale; another writer has touched it")]
    SnapshotStale,

    #[error("blocked by unresolved alert: {0}")]
    BlockedByAlert(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

pub type Result<T> = std::result::Result<T, ChainguardError>;
