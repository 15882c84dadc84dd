use chrono::Utc;
use futures::future::BoxFuture;
use uuid::Uuid;

use chainguard_core::model::{KanbanBoard, KanbanColumn};
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `kanban_init`: ensures a board exists (a no-op beyond touching the
/// project, since `KanbanBoard` is always present via `Default`).
pub fn kanban_init<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        super::mark_dirty(app, &resolved.project_id).await;
        ToolResponse::single("Kanban board ready.".to_string())
    })
}

fn render_board(board: &KanbanBoard) -> String {
    let mut lines = Vec::new();
    for column in [KanbanColumn::Backlog, KanbanColumn::InProgress, KanbanColumn::Review, KanbanColumn::Done] {
        let cards: Vec<String> = board
            .active_cards()
            .filter(|c| c.column == column)
            .map(|c| format!("  [{}] {}", &c.id.to_string()[..8], c.title))
            .collect();
        lines.push(format!("{column:?}:"));
        if cards.is_empty() {
            lines.push("  (empty)".to_string());
        } else {
            lines.extend(cards);
        }
    }
    lines.join("\n")
}

/// `kanban`: renders the whole board grouped by column.
pub fn kanban<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let state = resolved.state.lock().await;
        ToolResponse::single(render_board(&state.kanban))
    })
}

/// `kanban_show`: alias of `kanban` (named separately per the tool
/// surface; kept distinct so a host UI can bind different affordances).
pub fn kanban_show<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    kanban(app, resolved)
}

/// `kanban_add`: creates a card in `backlog`.
pub fn kanban_add<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(title) = resolved.req.arg_str("title").map(str::to_string) else {
            return ToolResponse::single("INVALID_INPUT: missing `title`".to_string());
        };
        let description = resolved.req.arg_str("description").unwrap_or("").to_string();

        let id = {
            let mut state = resolved.state.lock().await;
            state.kanban.add(title, description, Utc::now())
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(format!("Card created: {id}"))
    })
}

fn parse_card_id(resolved: &ResolvedRequest<'_>) -> Result<Uuid, ToolResponse> {
    let Some(raw) = resolved.req.arg_str("id") else {
        return Err(ToolResponse::single("INVALID_INPUT: missing `id`".to_string()));
    };
    Uuid::parse_str(raw).map_err(|err| ToolResponse::single(format!("INVALID_INPUT: bad card id: {err}")))
}

/// `kanban_move`: moves a card to a new column.
pub fn kanban_move<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let id = match parse_card_id(&resolved) {
            Ok(id) => id,
            Err(resp) => return resp,
        };
        let Some(column) = resolved.req.arg_str("column").and_then(KanbanColumn::parse) else {
            return ToolResponse::single("INVALID_INPUT: `column` must be one of backlog, in_progress, review, done".to_string());
        };

        let moved = {
            let mut state = resolved.state.lock().await;
            state.kanban.move_card(id, column, Utc::now())
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(if moved { format!("Card {id} moved to {column:?}.") } else { format!("No such card: {id}") })
    })
}

/// `kanban_detail`: renders a single card's fields.
pub fn kanban_detail<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let id = match parse_card_id(&resolved) {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        let state = resolved.state.lock().await;
        match state.kanban.cards.iter().find(|c| c.id == id) {
            Some(card) => ToolResponse::single(format!(
                "{} [{:?}]\n{}\ncreated={} updated={} archived={}",
                card.title, card.column, card.description, card.created_at, card.updated_at, card.archived
            )),
            None => ToolResponse::single(format!("No such card: {id}")),
        }
    })
}

/// `kanban_update`: edits a card's title and/or description.
pub fn kanban_update<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let id = match parse_card_id(&resolved) {
            Ok(id) => id,
            Err(resp) => return resp,
        };
        let title = resolved.req.arg_str("title").map(str::to_string);
        let description = resolved.req.arg_str("description").map(str::to_string);

        let updated = {
            let mut state = resolved.state.lock().await;
            state.kanban.update(id, title, description, Utc::now())
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(if updated { format!("Card {id} updated.") } else { format!("No such card: {id}") })
    })
}

/// `kanban_delete`: removes a card permanently.
pub fn kanban_delete<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let id = match parse_card_id(&resolved) {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        let deleted = {
            let mut state = resolved.state.lock().await;
            state.kanban.delete(id, Utc::now())
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(if deleted { format!("Card {id} deleted.") } else { format!("No such card: {id}") })
    })
}

/// `kanban_archive`: soft-deletes a card.
pub fn kanban_archive<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let id = match parse_card_id(&resolved) {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        let archived = {
            let mut state = resolved.state.lock().await;
            state.kanban.archive(id, Utc::now())
        };
        super::mark_dirty(app, &resolved.project_id).await;

        ToolResponse::single(if archived { format!("Card {id} archived.") } else { format!("No such card: {id}") })
    })
}

/// `kanban_history`: the board's append-only move/edit log.
pub fn kanban_history<'a>(_app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let limit = resolved.req.args.get("limit").and_then(|v| v.as_u64()).unwrap_or(20) as usize;

        let state = resolved.state.lock().await;
        if state.kanban.history.is_empty() {
            return ToolResponse::single("No kanban history yet.".to_string());
        }

        let lines: Vec<String> = state
            .kanban
            .history
            .iter()
            .rev()
            .take(limit)
            .map(|h| format!("{} {} {}", h.ts.to_rfc3339(), h.card_id, h.event))
            .collect();
        ToolResponse::single(lines.join("\n"))
    })
}
