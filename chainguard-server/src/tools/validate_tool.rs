use std::path::Path;

use futures::future::BoxFuture;

use chainguard_protocol::ToolResponse;
use chainguard_validator::ValidationOutcome;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `validate`: standalone syntax check, independent of `track`'s cascade.
/// Also accepts `status=PASS` to let an agent mark a prior failure resolved
/// without re-running the tool (§4.5 gate 5).
pub fn validate<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        if let Some(status) = resolved.req.arg_str("status") {
            if status.eq_ignore_ascii_case("pass") {
                let mut state = resolved.state.lock().await;
                state.validations_failed = 0;
                drop(state);
                super::mark_dirty(app, &resolved.project_id).await;
                return ToolResponse::single("Recorded: validations marked passing.".to_string());
            }
        }

        let Some(file) = resolved.req.arg_str("file") else {
            return ToolResponse::single("INVALID_INPUT: missing `file`".to_string());
        };

        let report = chainguard_validator::validate(Path::new(file), app.settings.syntax_validator_timeout).await;
        let text = match report.outcome {
            ValidationOutcome::Valid => format!("PASS ({})", report.checked),
            ValidationOutcome::Skipped => format!("SKIP ({}): {}", report.checked, report.errors.join("; ")),
            ValidationOutcome::Invalid => format!("FAIL ({}): {}", report.checked, report.errors.join("; ")),
        };

        {
            let mut state = resolved.state.lock().await;
            match report.outcome {
                ValidationOutcome::Valid => state.validations_passed += 1,
                ValidationOutcome::Invalid => state.validations_failed += 1,
                ValidationOutcome::Skipped => {}
            }
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(text)
    })
}
