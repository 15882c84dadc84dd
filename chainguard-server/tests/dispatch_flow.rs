//! End-to-end dispatcher tests: scope gate, context-marker self-healing,
//! and the set_scope -> track -> finish happy path (§4.2, §4.4, §4.5).

use std::collections::HashMap;
use std::sync::Arc;

use chainguard_core::config::Settings;
use chainguard_server::{AppState, Dispatcher};

use chainguard_protocol::{request, CONTEXT_MARKER, CONTEXT_REFRESH_TEXT, SCOPE_BLOCKED_TEXT};

fn test_app() -> (Dispatcher, tempfile::TempDir, tempfile::TempDir) {
    let home = tempfile::tempdir().expect("home tempdir");
    let project = tempfile::tempdir().expect("project tempdir");

    let settings = Settings { chainguard_home: home.path().to_path_buf(), ..Settings::default() };
    let app = Arc::new(AppState::new(settings));
    (Dispatcher::new(app), home, project)
}

fn args_with_working_dir(
    project_dir: &std::path::Path,
    mut extra: HashMap<&'static str, serde_json::Value>,
) -> HashMap<&'static str, serde_json::Value> {
    extra.insert("working_dir", serde_json::json!(project_dir.to_string_lossy()));
    extra
}

#[tokio::test]
async fn scope_gate_blocks_tools_without_scope() {
    let (dispatcher, _home, project) = test_app();

    let args = args_with_working_dir(project.path(), HashMap::new());
    let req = request("track", args);
    let resp = dispatcher.dispatch(req).await;

    assert!(resp.chunks.iter().any(|c| c == SCOPE_BLOCKED_TEXT));
}

#[tokio::test]
async fn always_allowed_tools_run_without_scope() {
    let (dispatcher, _home, project) = test_app();

    let args = args_with_working_dir(project.path(), HashMap::new());
    let req = request("config", args);
    let resp = dispatcher.dispatch(req).await;

    assert!(!resp.chunks.iter().any(|c| c == SCOPE_BLOCKED_TEXT));
}

#[tokio::test]
async fn missing_context_marker_prepends_refresh_text() {
    let (dispatcher, _home, project) = test_app();

    let args = args_with_working_dir(project.path(), HashMap::new());
    let req = request("config", args);
    let resp = dispatcher.dispatch(req).await;

    assert_eq!(resp.chunks[0], CONTEXT_REFRESH_TEXT);
}

#[tokio::test]
async fn context_marker_present_skips_refresh_text() {
    let (dispatcher, _home, project) = test_app();

    let mut extra = HashMap::new();
    extra.insert("ctx", serde_json::json!(CONTEXT_MARKER));
    let args = args_with_working_dir(project.path(), extra);
    let req = request("config", args);
    let resp = dispatcher.dispatch(req).await;

    assert!(resp.chunks.iter().all(|c| c != CONTEXT_REFRESH_TEXT));
}

#[tokio::test]
async fn set_scope_then_track_then_finish_happy_path() {
    let (dispatcher, _home, project) = test_app();

    let mut ctx = HashMap::new();
    ctx.insert("ctx", serde_json::json!(CONTEXT_MARKER));

    let mut scope_args = ctx.clone();
    scope_args.insert("description", serde_json::json!("add a notes feature"));
    scope_args.insert("modules", serde_json::json!(["*.txt"]));
    let resp = dispatcher.dispatch(request("set_scope", args_with_working_dir(project.path(), scope_args))).await;
    assert!(!resp.chunks.iter().any(|c| c == SCOPE_BLOCKED_TEXT));

    let mut track_args = ctx.clone();
    track_args.insert("file", serde_json::json!("notes.txt"));
    let resp = dispatcher.dispatch(request("track", args_with_working_dir(project.path(), track_args))).await;
    assert!(!resp.chunks.iter().any(|c| c == SCOPE_BLOCKED_TEXT));

    let mut finish_probe = ctx.clone();
    finish_probe.insert("confirmed", serde_json::json!(false));
    let resp = dispatcher.dispatch(request("finish", args_with_working_dir(project.path(), finish_probe))).await;
    assert!(resp.chunks.iter().any(|c| c.contains("Call finish again")));

    let mut finish_confirm = ctx.clone();
    finish_confirm.insert("confirmed", serde_json::json!(true));
    let resp = dispatcher.dispatch(request("finish", args_with_working_dir(project.path(), finish_confirm))).await;
    assert!(resp.chunks.iter().any(|c| c.contains("Scope finished")));
}

#[tokio::test]
async fn unknown_tool_returns_unknown_tool_message() {
    let (dispatcher, _home, project) = test_app();

    let mut ctx = HashMap::new();
    ctx.insert("ctx", serde_json::json!(CONTEXT_MARKER));

    let mut scope_args = ctx.clone();
    scope_args.insert("description", serde_json::json!("anything"));
    dispatcher.dispatch(request("set_scope", args_with_working_dir(project.path(), scope_args))).await;

    let resp = dispatcher.dispatch(request("does_not_exist", args_with_working_dir(project.path(), ctx))).await;
    assert!(resp.chunks.iter().any(|c| c.contains("Unknown tool")));
}
