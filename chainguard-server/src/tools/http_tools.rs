use futures::future::BoxFuture;

use chainguard_http::Credentials;
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `set_base_url`: records the target application's base URL for this
/// project's HTTP session.
pub fn set_base_url<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(base_url) = resolved.req.arg_str("base_url").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `base_url`".to_string());
        };
        app.http_sessions.lock().await.set_base_url(&resolved.project_id, base_url.clone());
        ToolResponse::single(format!("Base URL set to {base_url}"))
    })
}

/// `login`: authenticates against the configured base URL and stores the
/// session for reuse by `test_endpoint`.
pub fn login<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let args = resolved.req.args.clone();
        let credentials: Result<Credentials, _> = serde_json::from_value(args);
        let credentials = match credentials {
            Ok(c) => c,
            Err(err) => return ToolResponse::single(format!("INVALID_INPUT: {err}")),
        };

        let result = app.http_sessions.lock().await.login(&resolved.project_id, credentials).await;
        match result {
            Ok(()) => ToolResponse::single("Login attempted; session stored.".to_string()),
            Err(err) => ToolResponse::single(format!("LOGIN_FAILED: {err}")),
        }
    })
}

/// `test_endpoint`: probes `path` with the current session, re-logging in
/// silently if the session looks expired.
pub fn test_endpoint<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(path) = resolved.req.arg_str("path").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `path`".to_string());
        };
        let method = resolved.req.arg_str("method").unwrap_or("GET").to_string();

        let result = app.http_sessions.lock().await.test_endpoint(&resolved.project_id, &path, &method).await;
        match result {
            Ok(endpoint) => {
                {
                    let mut state = resolved.state.lock().await;
                    state.http_tests_performed += 1;
                }
                super::mark_dirty(app, &resolved.project_id).await;
                ToolResponse::single(format!(
                    "status={} auth_required={}\n{}",
                    endpoint.status, endpoint.auth_required, endpoint.body_excerpt
                ))
            }
            Err(err) => ToolResponse::single(format!("REQUEST_FAILED: {err}")),
        }
    })
}

/// `clear_session`: drops the stored session for this project.
pub fn clear_session<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        app.http_sessions.lock().await.clear_session(&resolved.project_id);
        ToolResponse::single("Session cleared.".to_string())
    })
}
