use chrono::Utc;
use futures::future::BoxFuture;

use chainguard_core::model::{Alert, AlertSeverity};
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `alert`: records an operator- or agent-raised alert against the
/// project. `severity` is one of `info`, `warn`, `blocking` (default `warn`).
pub fn alert<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(message) = resolved.req.arg_str("message").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `message`".to_string());
        };
        let severity = match resolved.req.arg_str("severity") {
            Some("info") => AlertSeverity::Info,
            Some("blocking") => AlertSeverity::Blocking,
            _ => AlertSeverity::Warn,
        };

        {
            let mut state = resolved.state.lock().await;
            state.alerts.push(Alert::new(message.clone(), severity, Utc::now()));
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Alert recorded: {message}"))
    })
}

/// `clear_alerts`: acknowledges every current alert, or just the ones
/// matching `message_contains` if given.
pub fn clear_alerts<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let filter = resolved.req.arg_str("message_contains").map(str::to_lowercase);

        let cleared = {
            let mut state = resolved.state.lock().await;
            let mut cleared = 0;
            for alert in state.alerts.iter_mut() {
                let matches = filter.as_ref().is_none_or(|f| alert.message.to_lowercase().contains(f.as_str()));
                if matches && !alert.acknowledged {
                    alert.acknowledged = true;
                    cleared += 1;
                }
            }
            cleared
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("{cleared} alert(s) acknowledged."))
    })
}
