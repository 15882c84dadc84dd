use chrono::Utc;
use futures::future::BoxFuture;

use chainguard_db::DbConfig;
use chainguard_protocol::ToolResponse;

use crate::dispatch::ResolvedRequest;
use crate::state::AppState;

/// `db_connect`: opens (and stores) a connection for this project.
pub fn db_connect<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let config: Result<DbConfig, _> = serde_json::from_value(resolved.req.args.clone());
        let config = match config {
            Ok(c) => c,
            Err(err) => return ToolResponse::single(format!("INVALID_INPUT: {err}")),
        };

        match chainguard_db::connect(&config).await {
            Ok(conn) => {
                app.db_connections.lock().await.insert(resolved.project_id.clone(), conn);
                ToolResponse::single(format!("Connected ({:?}).", config.engine))
            }
            Err(err) => ToolResponse::single(format!("DB_CONNECT_FAILED: {err}")),
        }
    })
}

/// `db_schema`: cached or freshly fetched schema tree for this project's
/// connection.
pub fn db_schema<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let force_refresh = resolved.req.arg_bool("force_refresh").unwrap_or(false);

        {
            let mut cache = app.db_schema_cache.lock().await;
            if let Some(schema) = cache.cached(&resolved.project_id, force_refresh) {
                return ToolResponse::single(chainguard_db::format_schema(schema));
            }
        }

        let connections = app.db_connections.lock().await;
        let Some(conn) = connections.get(&resolved.project_id) else {
            return ToolResponse::single("DB_NOT_CONNECTED: call db_connect first.".to_string());
        };

        match chainguard_db::fetch_schema(conn).await {
            Ok(schema) => {
                let text = chainguard_db::format_schema(&schema);
                app.db_schema_cache.lock().await.store(&resolved.project_id, schema);
                drop(connections);

                {
                    let mut state = resolved.state.lock().await;
                    state.db_schema_checked_at = Some(Utc::now());
                }
                super::mark_dirty(app, &resolved.project_id).await;

                ToolResponse::single(text)
            }
            Err(err) => ToolResponse::single(format!("SCHEMA_FETCH_FAILED: {err}")),
        }
    })
}

/// `db_table`: the schema entry for a single table.
pub fn db_table<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        let Some(table) = resolved.req.arg_str("table") else {
            return ToolResponse::single("INVALID_INPUT: missing `table`".to_string());
        };

        let mut cache = app.db_schema_cache.lock().await;
        let Some(schema) = cache.cached(&resolved.project_id, false) else {
            return ToolResponse::single("No cached schema; call db_schema first.".to_string());
        };

        match schema.tables.iter().find(|t| t.name == table) {
            Some(found) => {
                let single = chainguard_db::Schema { tables: vec![found.clone()], fetched_at: schema.fetched_at };
                ToolResponse::single(chainguard_db::format_schema(&single))
            }
            None => ToolResponse::single(format!("Table `{table}` not found in cached schema.")),
        }
    })
}

/// `db_disconnect`: drops the stored connection and cached schema.
pub fn db_disconnect<'a>(app: &'a AppState, resolved: ResolvedRequest<'a>) -> BoxFuture<'a, ToolResponse> {
    Box::pin(async move {
        app.db_connections.lock().await.remove(&resolved.project_id);
        ToolResponse::single("Disconnected.".to_string())
    })
}
