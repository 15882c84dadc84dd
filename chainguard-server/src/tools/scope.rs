use chrono::Utc;
use futures::future::BoxFuture;

use chainguard_core::model::{ChecklistItem as ScopeChecklistItem, Phase, ScopeDefinition, TaskMode};
use chainguard_protocol::args::SetScopeArgs;
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `set_scope` (§4.3). Declares the active task; resets mode-dependent
/// state per invariant I6.
pub fn set_scope<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let args: SetScopeArgs = match serde_json::from_value(resolved.req.args.clone()) {
            Ok(args) => args,
            Err(err) => return ToolResponse::single(format!("INVALID_INPUT: {err}")),
        };

        let mode = args.mode.as_deref().map(TaskMode::parse).unwrap_or_default();
        let checklist: Vec<ScopeChecklistItem> = args
            .checklist
            .into_iter()
            .map(|c| ScopeChecklistItem { item: c.item, check: c.check })
            .collect();

        let (scope, truncated) = ScopeDefinition::new(
            args.description,
            args.modules,
            args.acceptance_criteria,
            checklist,
            Utc::now(),
        );

        {
            let mut state = resolved.state.lock().await;
            state.scope = Some(scope);
            state.mode = mode;
            state.criteria_status.clear();
            state.checklist_results.clear();
            state.out_of_scope_files = chainguard_common::BoundedSet::new(app.settings.out_of_scope_cap);
            state.changed_files = chainguard_common::BoundedSet::new(app.settings.changed_files_cap);
            state.phase = Phase::Implementation;
            state.files_changed = 0;
            state.files_since_validation = 0;
            state.validations_passed = 0;
            state.validations_failed = 0;
            state.tests_passed = 0;
            state.tests_failed = 0;
            state.http_tests_performed = 0;
            state.alerts.clear();
            state.note_activity(Utc::now());
        }

        if let Err(err) = app.projects.save_immediate(&resolved.project_id).await {
            tracing::warn!(project_id = %resolved.project_id, %err, "set_scope immediate save failed");
        }

        let mut chunks = vec![format!("Scope set. {}", mode.preamble())];
        if truncated {
            chunks.push("WARNING: description truncated to 500 characters.".to_string());
        }
        ToolResponse { chunks }
    })
}

pub fn status<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        let scope_desc = state.scope.as_ref().map(|s| s.description.as_str()).unwrap_or("(none)");
        let text = format!(
            "phase={} mode={} task={:?}\nscope: {}\nfiles_changed={} files_since_validation={} \
             validations_passed={} validations_failed={} tests_passed={} tests_failed={}\n\
             out_of_scope_files={} alerts={}",
            state.phase,
            state.mode.as_str(),
            state.current_task,
            scope_desc,
            state.files_changed,
            state.files_since_validation,
            state.validations_passed,
            state.validations_failed,
            state.tests_passed,
            state.tests_failed,
            state.out_of_scope_files.len(),
            state.alerts.len(),
        );
        ToolResponse::single(text)
    })
}

pub fn context<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        ToolResponse::single(format!(
            "{}\n\n{}",
            chainguard_protocol::CONTEXT_REFRESH_TEXT,
            state.mode.preamble()
        ))
    })
}

pub fn set_phase<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let phase_str = resolved.req.arg_str("phase").unwrap_or("unknown");
        let phase = parse_phase(phase_str);

        {
            let mut state = resolved.state.lock().await;
            state.phase = phase;
            state.note_activity(Utc::now());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Phase set to {phase}"))
    })
}

fn parse_phase(raw: &str) -> Phase {
    match raw {
        "planning" => Phase::Planning,
        "implementation" => Phase::Implementation,
        "testing" => Phase::Testing,
        "review" => Phase::Review,
        "done" => Phase::Done,
        _ => Phase::Unknown,
    }
}

/// `run_checklist` (§4.11): executes the scope's whitelisted checklist.
pub fn run_checklist<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let items: Vec<chainguard_checklist::ChecklistItem> = {
            let state = resolved.state.lock().await;
            state
                .scope
                .as_ref()
                .map(|s| {
                    s.checklist
                        .iter()
                        .map(|c| chainguard_checklist::ChecklistItem { item: c.item.clone(), check: c.check.clone() })
                        .collect()
                })
                .unwrap_or_default()
        };

        if items.is_empty() {
            return ToolResponse::single("No checklist items configured for this scope.".to_string());
        }

        let results = chainguard_checklist::run_all_async(&items).await;

        let mut lines = Vec::with_capacity(results.len());
        {
            let mut state = resolved.state.lock().await;
            for result in &results {
                state.checklist_results.insert(result.item.clone(), result.passed);
                lines.push(format!(
                    "{} {}: {}",
                    if result.passed { "PASS" } else { "FAIL" },
                    result.item,
                    result.detail
                ));
            }
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(lines.join("\n"))
    })
}

/// `check_criteria`: marks an acceptance criterion fulfilled or not.
pub fn check_criteria<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(criterion) = resolved.req.arg_str("criterion").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `criterion`".to_string());
        };
        let fulfilled = resolved.req.arg_bool("fulfilled").unwrap_or(true);

        {
            let mut state = resolved.state.lock().await;
            state.criteria_status.insert(criterion.clone(), fulfilled);
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Criterion `{criterion}` marked {}", if fulfilled { "fulfilled" } else { "unfulfilled" }))
    })
}
