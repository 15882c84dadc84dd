//! Tool dispatch and the scope gate (§4.2). `dispatch` is the core the
//! binary's stdin/stdout loop drives; a richer host runtime can call it
//! directly with parsed requests instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use chainguard_core::model::ProjectState;
use chainguard_protocol::{is_always_allowed, ToolRequest, ToolResponse, SCOPE_BLOCKED_TEXT};

use crate::state::AppState;
use crate::tools;

pub type ToolHandler = for<'a> fn(&'a AppState, ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse>;

/// A request paired with the project state it resolved to, handed to every
/// handler so none of them re-derive the project identity themselves.
pub struct ResolvedRequest<'a> {
    pub req: &'a ToolRequest,
    pub project_id: String,
    pub state: Arc<Mutex<ProjectState>>,
}

pub struct Dispatcher {
    pub app: Arc<AppState>,
    handlers: HashMap<&'static str, ToolHandler>,
}

impl Dispatcher {
    pub fn new(app: Arc<AppState>) -> Self {
        Self { app, handlers: tools::registry() }
    }

    pub async fn dispatch(&self, req: ToolRequest) -> ToolResponse {
        let working_dir = working_dir_for(&req);

        let state = match self.app.projects.load(&working_dir).await {
            Ok(state) => state,
            Err(err) => {
                return ToolResponse::single(format!("INTERNAL: could not load project state: {err}"));
            }
        };
        let project_id = state.lock().await.project_id.clone();

        if !is_always_allowed(&req.tool) {
            let has_scope = state.lock().await.scope.is_some();
            if !has_scope {
                return ToolResponse::single(SCOPE_BLOCKED_TEXT);
            }
        }

        let has_context_marker = req.has_context_marker();

        let Some(handler) = self.handlers.get(req.tool.as_str()) else {
            return ToolResponse::single(format!("Unknown tool: {}", req.tool));
        };

        let resolved = ResolvedRequest { req: &req, project_id, state };
        let response = handler(&self.app, resolved).await;

        if has_context_marker {
            response
        } else {
            response.with_context_refresh()
        }
    }
}

fn working_dir_for(req: &ToolRequest) -> PathBuf {
    match req.working_dir() {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf()),
    }
}
