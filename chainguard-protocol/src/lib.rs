//! Wire envelope for the tool-dispatch channel (§6).
//!
//! The concrete transport framing is an external collaborator (a host tool
//! runtime may speak MCP, a custom RPC, or the line-framed JSON this crate
//! defines); what matters to the rest of the workspace is this envelope:
//! one request in, one list of text chunks out.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An inbound tool call. `args` is a JSON object whose shape is
/// tool-specific; handlers validate it themselves (§9 "dynamic argument
/// objects").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl ToolRequest {
    /// The sentinel `ctx` field the agent must echo to prove it still holds
    /// the rule set (§4.2 step 3). Missing or mismatched never blocks the
    /// call; it only changes whether the refresh preamble is prepended.
    pub fn has_context_marker(&self) -> bool {
        self.args
            .get("ctx")
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == CONTEXT_MARKER)
    }

    /// `working_dir` argument if present, used to resolve the project.
    pub fn working_dir(&self) -> Option<&str> {
        self.args.get("working_dir").and_then(|v| v.as_str())
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }

    pub fn arg_bool(&self, key: &str) -> Option<bool> {
        self.args.get(key).and_then(|v| v.as_bool())
    }

    pub fn arg_object(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.args.as_object()
    }
}

/// A tool's response: a list of text chunks, concatenated by the host when
/// rendered back to the agent. Empty means "nothing noteworthy happened"
/// (§4.4 step 6 — the happy path is free).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResponse {
    pub chunks: Vec<String>,
}

impl ToolResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(text: impl Into<String>) -> Self {
        Self { chunks: vec![text.into()] }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(|c| c.is_empty())
    }

    /// Prepends the context-refresh preamble (§4.2 step 3).
    pub fn with_context_refresh(mut self) -> Self {
        self.chunks.insert(0, CONTEXT_REFRESH_TEXT.to_string());
        self
    }
}

/// The context marker value the agent must echo in `args.ctx`.
pub const CONTEXT_MARKER: &str = "🔗";

/// Re-teaches the agent the three key rules when it calls without the
/// context marker (§4.2 step 3).
pub const CONTEXT_REFRESH_TEXT: &str = "\
[CONTEXT REFRESH]\n\
1. Declare a task scope with set_scope before editing any files.\n\
2. Inspect the live database schema before touching schema-affecting files.\n\
3. Every file change is force-validated; resolve alerts and tests before finish.";

/// Text returned when the scope gate blocks a call (§4.2 step 2).
pub const SCOPE_BLOCKED_TEXT: &str =
    "SCOPE_BLOCKED: no active scope. Call set_scope before using this tool.";

/// Tools that may run without an active scope (§4.2 step 2).
pub fn is_always_allowed(tool: &str) -> bool {
    matches!(tool, "set_scope" | "projects" | "config") || tool.starts_with("kanban_")
}

/// Error surfaced when a tool argument is missing or malformed at the
/// dispatcher boundary (§7 `InvalidInput`).
#[derive(Debug, thiserror::Error)]
#[error("invalid input for `{tool}`: {reason}")]
pub struct InvalidInputError {
    pub tool: String,
    pub reason: String,
}

/// Typed argument records shared by more than one tool handler, kept here
/// (rather than duplicated per-handler) so their `schemars::JsonSchema`
/// impls double as the documented input schema (§6).
pub mod args {
    use super::*;
    use schemars::JsonSchema;

    #[derive(Debug, Clone, Deserialize, JsonSchema)]
    pub struct SetScopeArgs {
        pub description: String,
        #[serde(default)]
        pub modules: Vec<String>,
        #[serde(default)]
        pub acceptance_criteria: Vec<String>,
        #[serde(default)]
        pub checklist: Vec<ChecklistItemArg>,
        #[serde(default)]
        pub mode: Option<String>,
        #[serde(default)]
        pub working_dir: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize, JsonSchema)]
    pub struct ChecklistItemArg {
        pub item: String,
        pub check: String,
    }

    #[derive(Debug, Clone, Deserialize, JsonSchema)]
    pub struct TrackArgs {
        pub file: String,
        #[serde(default = "default_action")]
        pub action: String,
        #[serde(default)]
        pub skip_validation: bool,
        #[serde(default)]
        pub working_dir: Option<String>,
    }

    fn default_action() -> String {
        "edit".to_string()
    }

    #[derive(Debug, Clone, Deserialize, JsonSchema)]
    pub struct FinishArgs {
        #[serde(default)]
        pub confirmed: bool,
        #[serde(default)]
        pub force: bool,
        #[serde(default)]
        pub working_dir: Option<String>,
    }
}

/// Convenience constructor used by tests and handlers building a request
/// by hand instead of deserializing one from the wire.
pub fn request(tool: &str, args: HashMap<&str, serde_json::Value>) -> ToolRequest {
    ToolRequest {
        tool: tool.to_string(),
        args: serde_json::to_value(args).unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_marker_detection() {
        let mut args = HashMap::new();
        args.insert("ctx", serde_json::json!(CONTEXT_MARKER));
        let req = request("track", args);
        assert!(req.has_context_marker());

        let req2 = ToolRequest { tool: "track".into(), args: serde_json::json!({}) };
        assert!(!req2.has_context_marker());
    }

    #[test]
    fn always_allowed_tools() {
        assert!(is_always_allowed("set_scope"));
        assert!(is_always_allowed("kanban_show"));
        assert!(!is_always_allowed("track"));
    }

    #[test]
    fn response_context_refresh_prepends() {
        let resp = ToolResponse::single("ok").with_context_refresh();
        assert_eq!(resp.chunks.len(), 2);
        assert_eq!(resp.chunks[0], CONTEXT_REFRESH_TEXT);
    }
}
