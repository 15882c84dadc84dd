use futures::future::BoxFuture;

use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `word_count` (content mode): adds `delta` words to the running total.
pub fn word_count<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let delta = resolved.req.args.get("delta").and_then(|v| v.as_i64()).unwrap_or(0);

        let total = {
            let mut state = resolved.state.lock().await;
            state.word_count = state.word_count.saturating_add_signed(delta);
            state.word_count
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("word_count={total}"))
    })
}

/// `track_chapter` (content mode): appends a chapter title/slug.
pub fn track_chapter<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(chapter) = resolved.req.arg_str("chapter").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `chapter`".to_string());
        };

        {
            let mut state = resolved.state.lock().await;
            state.chapters.push(chapter.clone());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Chapter tracked: {chapter}"))
    })
}

/// `log_command` (devops mode): appends a command to the audit log.
pub fn log_command<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(command) = resolved.req.arg_str("command").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `command`".to_string());
        };

        {
            let mut state = resolved.state.lock().await;
            state.command_log.push(command.clone());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(String::new())
    })
}

/// `checkpoint` (devops mode): records a named checkpoint.
pub fn checkpoint<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let label = resolved.req.arg_str("label").unwrap_or("checkpoint").to_string();

        {
            let mut state = resolved.state.lock().await;
            state.checkpoints.push(label.clone());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Checkpoint recorded: {label}"))
    })
}

/// `health_check` (devops mode): records a health-check result.
pub fn health_check<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let status = resolved.req.arg_str("status").unwrap_or("unknown").to_string();
        let detail = resolved.req.arg_str("detail").unwrap_or("");
        let entry = format!("{status}: {detail}");

        {
            let mut state = resolved.state.lock().await;
            state.health_checks.push(entry.clone());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Health check recorded: {entry}"))
    })
}

/// `add_source` (research mode): appends a source reference.
pub fn add_source<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(source) = resolved.req.arg_str("source").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `source`".to_string());
        };

        {
            let mut state = resolved.state.lock().await;
            state.sources.push(source.clone());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Source recorded: {source}"))
    })
}

/// `index_fact` (research mode): appends an indexed fact.
pub fn index_fact<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(fact) = resolved.req.arg_str("fact").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `fact`".to_string());
        };

        {
            let mut state = resolved.state.lock().await;
            state.facts.push(fact.clone());
        }
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Fact indexed: {fact}"))
    })
}

/// `sources`: lists all recorded sources.
pub fn sources<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        if state.sources.is_empty() {
            ToolResponse::single("No sources recorded.".to_string())
        } else {
            ToolResponse::single(state.sources.join("\n"))
        }
    })
}

/// `facts`: lists all indexed facts.
pub fn facts<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        if state.facts.is_empty() {
            ToolResponse::single("No facts indexed.".to_string())
        } else {
            ToolResponse::single(state.facts.join("\n"))
        }
    })
}
