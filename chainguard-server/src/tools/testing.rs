use futures::future::BoxFuture;

use chainguard_core::model::TestConfig;
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `test_config`: stores the command `run_tests` should execute.
pub fn test_config<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let config: Result<TestConfig, _> = serde_json::from_value(resolved.req.args.clone());
        let config = match config {
            Ok(c) => c,
            Err(err) => return ToolResponse::single(format!("INVALID_INPUT: {err}")),
        };

        {
            let mut state = resolved.state.lock().await;
            state.test_config = Some(config);
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single("Test configuration stored.".to_string())
    })
}

/// `run_tests`: executes the stored (or inline) `TestConfig` and records
/// the parsed result.
pub fn run_tests<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let inline: Option<TestConfig> = serde_json::from_value(resolved.req.args.clone()).ok();
        let config = match inline {
            Some(config) if !config.command.is_empty() => Some(config),
            _ => resolved.state.lock().await.test_config.clone(),
        };

        let Some(config) = config else {
            return ToolResponse::single("INVALID_INPUT: no test_config stored; call test_config first.".to_string());
        };

        let result = chainguard_testrunner::run_tests(&config).await;
        match result {
            Ok(test_result) => {
                let text = format!(
                    "success={} passed={} failed={} framework={}\n{}",
                    test_result.success,
                    test_result.passed,
                    test_result.failed,
                    test_result.framework.as_deref().unwrap_or("unknown"),
                    test_result.summary,
                );

                {
                    let mut state = resolved.state.lock().await;
                    if test_result.success {
                        state.tests_passed += 1;
                    } else {
                        state.tests_failed += 1;
                    }
                    state.test_results = Some(test_result);
                }
                super::mark_dirty(app, &resolved.project_id).await;

                ToolResponse::single(text)
            }
            Err(err) => ToolResponse::single(format!("TEST_RUN_FAILED: {err}")),
        }
    })
}

/// `test_status`: reports the last recorded test result, if any.
pub fn test_status<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        match &state.test_results {
            Some(result) => ToolResponse::single(format!(
                "success={} passed={} failed={} framework={}",
                result.success,
                result.passed,
                result.failed,
                result.framework.as_deref().unwrap_or("unknown"),
            )),
            None => ToolResponse::single("No tests have been run yet.".to_string()),
        }
    })
}
