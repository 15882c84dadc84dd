use chrono::Utc;
use futures::future::BoxFuture;

use chainguard_core::history::ErrorEntry;
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `recall`: best-matching past errors regardless of whether they carry a
/// recorded resolution (§4.7).
pub fn recall<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(query) = resolved.req.arg_str("query") else {
            return ToolResponse::single("INVALID_INPUT: missing `query`".to_string());
        };
        let limit = app.settings.auto_suggest_max_results.max(1);

        let state = resolved.state.lock().await;
        let matches = state.error_index.recall(query, limit);
        if matches.is_empty() {
            return ToolResponse::single("No similar past errors found.".to_string());
        }

        let lines: Vec<String> = matches
            .iter()
            .map(|e| {
                format!(
                    "{} [{}]: {}{}",
                    e.file_pattern,
                    e.error_type,
                    e.error_msg,
                    e.resolution.as_deref().map(|r| format!(" -> resolved: {r}")).unwrap_or_default()
                )
            })
            .collect();
        ToolResponse::single(lines.join("\n"))
    })
}

/// `history`: the last N tracked file events.
pub fn history<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let limit = resolved.req.args.get("limit").and_then(|v| v.as_u64()).unwrap_or(20) as usize;

        let state = resolved.state.lock().await;
        if state.history.is_empty() {
            return ToolResponse::single("No tracked history yet.".to_string());
        }

        let lines: Vec<String> = state
            .history
            .iter()
            .rev()
            .take(limit)
            .map(|h| format!("{} {:?} {} [{}]", h.ts.to_rfc3339(), h.action, h.file, h.validation))
            .collect();
        ToolResponse::single(lines.join("\n"))
    })
}

/// `learn`: records a resolution against the most recent matching error so
/// future `track` failures can surface it (§4.7).
pub fn learn<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(error_msg) = resolved.req.arg_str("error_msg").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `error_msg`".to_string());
        };
        let Some(resolution) = resolved.req.arg_str("resolution").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `resolution`".to_string());
        };

        let updated = {
            let mut state = resolved.state.lock().await;
            let mut found = false;
            for entry in state.error_index.entries_mut().iter_mut().rev() {
                if entry.error_msg == error_msg && entry.resolution.is_none() {
                    entry.resolution = Some(resolution.clone());
                    found = true;
                    break;
                }
            }
            if !found {
                let scope_desc = state.scope.as_ref().map(|s| s.description.clone());
                state.error_index.push(ErrorEntry {
                    ts: Utc::now(),
                    file_pattern: "*".to_string(),
                    error_type: "manual".to_string(),
                    error_msg: error_msg.clone(),
                    scope_desc,
                    project_id: resolved.project_id.clone(),
                    resolution: Some(resolution.clone()),
                });
            }
            found
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(if updated {
            format!("Resolution recorded for an existing error: {resolution}")
        } else {
            format!("New resolved error entry recorded: {resolution}")
        })
    })
}
