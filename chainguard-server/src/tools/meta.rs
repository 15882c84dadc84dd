use futures::future::BoxFuture;

use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `projects`: lists the projects currently cached in memory. Always
/// allowed, even without a scope.
pub fn projects<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let _ = &resolved;
        let ids = app.projects.cached_project_ids().await;
        if ids.is_empty() {
            ToolResponse::single("No projects cached.".to_string())
        } else {
            ToolResponse::single(ids.join("\n"))
        }
    })
}

/// `config`: echoes the effective settings. Always allowed.
pub fn config<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let _ = &resolved;
        let s = &app.settings;
        ToolResponse::single(format!(
            "chainguard_home={}\ndebounce_window={:?}\nproject_cache_capacity={}\n\
             db_schema_check_ttl={:?}\nhttp_session_ttl={:?}\nsimilarity_threshold={}\n\
             auto_suggest_max_results={}\nchecklist_item_timeout={:?}",
            s.chainguard_home.display(),
            s.debounce_window,
            s.project_cache_capacity,
            s.db_schema_check_ttl,
            s.http_session_ttl,
            s.similarity_threshold,
            s.auto_suggest_max_results,
            s.checklist_item_timeout,
        ))
    })
}
