use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::future::BoxFuture;

use chainguard_core::history::{file_pattern, ErrorEntry, FileAction, HistoryEntry};
use chainguard_core::model::{AlertSeverity, Alert, ModeFeatures};
use chainguard_protocol::args::TrackArgs;
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `track` (§4.4): the six-step cascade run on every file touch.
pub fn track<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move { track_one(app, &resolved.project_id, &resolved.state, resolved.req.args.clone()).await })
}

/// `track_batch` (ADDED, §4.4): runs `track` per item under the same
/// project lock, concatenating non-empty chunks.
pub fn track_batch<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(items) = resolved.req.args.get("files").and_then(|v| v.as_array()) else {
            return ToolResponse::single("INVALID_INPUT: missing `files` array".to_string());
        };

        let mut chunks = Vec::new();
        for item in items {
            let response = track_one(app, &resolved.project_id, &resolved.state, item.clone()).await;
            chunks.extend(response.chunks.into_iter().filter(|c| !c.is_empty()));
        }
        ToolResponse { chunks }
    })
}

async fn track_one(
    app: &AppState,
    project_id: &str,
    state: &std::sync::Arc<tokio::sync::Mutex<chainguard_core::model::ProjectState>>,
    args: serde_json::Value,
) -> ToolResponse {
    let args: TrackArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(err) => return ToolResponse::single(format!("INVALID_INPUT: {err}")),
    };

    let mut notes: Vec<String> = Vec::new();
    let now = Utc::now();

    let project_path = { state.lock().await.project_path.clone() };
    let (sanitized, out_of_scope_by_path) = sanitize_path(&project_path, &args.file);

    let mode = { state.lock().await.mode };
    let features = ModeFeatures::for_mode(mode);

    if app.settings.matches_schema_pattern(&sanitized) {
        let mut guard = state.lock().await;
        guard.db_schema_checked_at = None;
        notes.push(format!(
            "SCHEMA_CHANGE: `{sanitized}` looks schema-affecting; re-inspect the database before relying on the cached schema."
        ));
    }

    let action = match args.action.as_str() {
        "create" => FileAction::Create,
        "delete" => FileAction::Delete,
        _ => FileAction::Edit,
    };

    let mut validation_summary = "SKIP".to_string();
    if features.syntax_validation && !args.skip_validation && action != FileAction::Delete {
        let path = Path::new(&sanitized);
        let report = chainguard_validator::validate(path, app.settings.syntax_validator_timeout).await;
        validation_summary = match report.outcome {
            chainguard_validator::ValidationOutcome::Valid => "PASS".to_string(),
            chainguard_validator::ValidationOutcome::Skipped => "SKIP".to_string(),
            chainguard_validator::ValidationOutcome::Invalid => {
                let error_msg = report.errors.join("; ");
                let pattern = file_pattern(&sanitized);

                let similar = {
                    let guard = state.lock().await;
                    guard
                        .error_index
                        .find_similar_errors(&error_msg, app.settings.similarity_threshold, app.settings.auto_suggest_max_results)
                        .into_iter()
                        .filter_map(|e| e.resolution.clone().map(|r| format!("`{}`: {r}", e.error_msg)))
                        .collect::<Vec<_>>()
                };

                {
                    let mut guard = state.lock().await;
                    guard.validations_failed += 1;
                    let scope_desc = guard.scope.as_ref().map(|s| s.description.clone());
                    guard.error_index.push(ErrorEntry {
                        ts: now,
                        file_pattern: pattern,
                        error_type: report.checked.clone(),
                        error_msg: error_msg.clone(),
                        scope_desc,
                        project_id: project_id.to_string(),
                        resolution: None,
                    });
                }

                let mut diag = format!("VALIDATION_FAILED: {} Syntax — {error_msg}", lang_label(&report.checked));
                if !similar.is_empty() {
                    diag.push_str("\nSimilar past errors:\n");
                    diag.push_str(&similar.join("\n"));
                }
                notes.push(diag);
                format!("FAIL:{error_msg}")
            }
        };

        if matches!(report.outcome, chainguard_validator::ValidationOutcome::Valid) {
            let mut guard = state.lock().await;
            guard.validations_passed += 1;
        }
    }

    let in_scope = {
        let guard = state.lock().await;
        guard.scope.as_ref().map(|s| s.contains_path(&sanitized)).unwrap_or(true)
    };

    {
        let mut guard = state.lock().await;
        if !in_scope || out_of_scope_by_path {
            guard.out_of_scope_files.push(sanitized.clone());
            guard.recent_actions.push(format!("out-of-scope touch: {sanitized}"));
            if !in_scope {
                notes.push(format!("OUT_OF_SCOPE: `{sanitized}` is not covered by the current scope's modules."));
            }
        }

        guard.files_changed += 1;
        guard.files_since_validation = if features.syntax_validation && !args.skip_validation {
            0
        } else {
            guard.files_since_validation + 1
        };
        guard.changed_files.push(sanitized.clone());
        guard.recent_actions.push(format!("{:?} {sanitized}", action));
        guard.note_activity(now);

        let scope_desc = guard.scope.as_ref().map(|s| s.description.clone());
        guard.history.push(HistoryEntry {
            ts: now,
            file: sanitized.clone(),
            action,
            validation: validation_summary,
            scope_id: None,
            scope_desc,
            fix_applied: None,
        });

        if out_of_scope_by_path {
            guard.alerts.push(Alert::new(
                format!("`{}` resolves outside the project root", args.file),
                AlertSeverity::Warn,
                now,
            ));
        }
    }

    super::mark_dirty(app, project_id).await;

    ToolResponse { chunks: notes }
}

/// Human-readable form of a validator language tag, e.g. `php` -> `PHP`.
fn lang_label(lang: &str) -> String {
    match lang {
        "php" => "PHP".to_string(),
        "json" => "JSON".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

/// Resolves `file` against `project_path`; returns the sanitized path and
/// whether it escapes the project root (§4.4 step 1).
fn sanitize_path(project_path: &str, file: &str) -> (String, bool) {
    let project_root = PathBuf::from(project_path);
    let candidate = PathBuf::from(file);
    let absolute = if candidate.is_absolute() { candidate } else { project_root.join(&candidate) };

    let normalized = normalize(&absolute);
    let escapes = !normalized.starts_with(normalize(&project_root));
    (normalized.to_string_lossy().into_owned(), escapes)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_path_detects_escape() {
        let (_, escapes) = sanitize_path("/home/user/project", "../../etc/passwd");
        assert!(escapes);
    }

    #[test]
    fn sanitize_path_keeps_in_project_file() {
        let (path, escapes) = sanitize_path("/home/user/project", "src/lib.rs");
        assert!(!escapes);
        assert_eq!(path, "/home/user/project/src/lib.rs");
    }

    #[test]
    fn lang_label_uppercases_php() {
        assert_eq!(lang_label("php"), "PHP");
        assert_eq!(lang_label("typescript"), "Typescript");
    }
}
