use futures::future::BoxFuture;

use chainguard_core::impact::analyze as analyze_impact;
use chainguard_core::model::{ModeFeatures, Phase};
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `analyze` (§4.12): standalone impact report over the project's
/// currently tracked changed files.
pub fn analyze<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        let changed: Vec<String> = state.changed_files.as_slice().to_vec();
        drop(state);

        let report = analyze_impact(&changed);
        ToolResponse::single(format_report(&report))
    })
}

fn format_report(report: &chainguard_core::impact::ImpactReport) -> String {
    if report.hints.is_empty() {
        return "No impact hints for the current change set.".to_string();
    }
    let mut lines: Vec<String> = report.hints.iter().map(|h| format!("{}: {}", h.file, h.hint)).collect();
    lines.truncate(10);
    if report.web_relevant {
        lines.push("Web-relevant files changed — consider HTTP smoke tests before finishing.".to_string());
    }
    lines.join("\n")
}

/// `finish` (§4.5): two-phase completion gate.
pub fn finish<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let confirmed = resolved.req.arg_bool("confirmed").unwrap_or(false);
        let force = resolved.req.arg_bool("force").unwrap_or(false);

        if !confirmed {
            let changed: Vec<String> = { resolved.state.lock().await.changed_files.as_slice().to_vec() };
            let report = analyze_impact(&changed);
            {
                let mut state = resolved.state.lock().await;
                state.impact_check_pending = true;
            }
            super::mark_dirty(app, &resolved.project_id).await;

            let mut text = format_report(&report);
            text.push_str("\n\nCall finish again with confirmed=true to complete.");
            return ToolResponse::single(text);
        }

        let state = resolved.state.lock().await;
        let mode = state.mode;
        let features = ModeFeatures::for_mode(mode);

        if state.has_unacknowledged_blocking_alert() {
            return ToolResponse::single(
                "FINISH_BLOCKED: an unacknowledged blocking alert exists. Resolve it with clear_alerts.".to_string(),
            );
        }

        let web_relevant = analyze_impact(state.changed_files.as_slice()).web_relevant;
        if features.http_enforcement && web_relevant && state.http_tests_performed == 0 && !force {
            return ToolResponse::single(
                "FINISH_BLOCKED: web-relevant files changed but no HTTP smoke test was run (test_endpoint). Pass force=true to override.".to_string(),
            );
        }

        if state.checklist_results.values().any(|passed| !passed) && !force {
            return ToolResponse::single(
                "FINISH_BLOCKED: at least one checklist item failed. Pass force=true to override.".to_string(),
            );
        }

        if state.criteria_status.values().any(|fulfilled| !fulfilled) && !force {
            return ToolResponse::single(
                "FINISH_BLOCKED: at least one acceptance criterion is unfulfilled. Pass force=true to override.".to_string(),
            );
        }

        if state.validations_failed > 0 && !force {
            return ToolResponse::single(
                "FINISH_BLOCKED: outstanding validation failures. Fix them or call validate(status=PASS). Pass force=true to override.".to_string(),
            );
        }

        drop(state);

        {
            let mut state = resolved.state.lock().await;
            state.phase = Phase::Done;
            state.scope = None;
            state.criteria_status.clear();
            state.checklist_results.clear();
            state.validations_failed = 0;
            state.files_since_validation = 0;
            state.impact_check_pending = false;
        }

        if let Err(err) = app.projects.save_immediate(&resolved.project_id).await {
            tracing::warn!(project_id = %resolved.project_id, %err, "finish immediate save failed");
        }

        ToolResponse::single("Scope finished. Phase set to done.".to_string())
    })
}
