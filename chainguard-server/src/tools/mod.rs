//! Tool handlers, one module per component area of §4. `registry()` builds
//! the dispatcher's `name -> handler` table once at startup.

mod alerts;
mod db_tools;
mod finish;
mod history_tools;
mod http_tools;
mod kanban_tools;
mod meta;
mod mode_tools;
mod scope;
mod testing;
mod tracking;
mod validate_tool;

use std::collections::HashMap;

use crate::dispatch::ToolHandler;

pub fn registry() -> HashMap<&'static str, ToolHandler> {
    let mut map: HashMap<&'static str, ToolHandler> = HashMap::new();

    map.insert("set_scope", scope::set_scope);
    map.insert("status", scope::status);
    map.insert("context", scope::context);
    map.insert("set_phase", scope::set_phase);

    map.insert("track", tracking::track);
    map.insert("track_batch", tracking::track_batch);

    map.insert("run_checklist", scope::run_checklist);
    map.insert("check_criteria", scope::check_criteria);

    map.insert("validate", validate_tool::validate);

    map.insert("alert", alerts::alert);
    map.insert("clear_alerts", alerts::clear_alerts);

    map.insert("projects", meta::projects);
    map.insert("config", meta::config);

    map.insert("test_endpoint", http_tools::test_endpoint);
    map.insert("login", http_tools::login);
    map.insert("set_base_url", http_tools::set_base_url);
    map.insert("clear_session", http_tools::clear_session);

    map.insert("analyze", finish::analyze);
    map.insert("finish", finish::finish);

    map.insert("test_config", testing::test_config);
    map.insert("run_tests", testing::run_tests);
    map.insert("test_status", testing::test_status);

    map.insert("recall", history_tools::recall);
    map.insert("history", history_tools::history);
    map.insert("learn", history_tools::learn);

    map.insert("db_connect", db_tools::db_connect);
    map.insert("db_schema", db_tools::db_schema);
    map.insert("db_table", db_tools::db_table);
    map.insert("db_disconnect", db_tools::db_disconnect);

    map.insert("word_count", mode_tools::word_count);
    map.insert("track_chapter", mode_tools::track_chapter);
    map.insert("log_command", mode_tools::log_command);
    map.insert("checkpoint", mode_tools::checkpoint);
    map.insert("health_check", mode_tools::health_check);
    map.insert("add_source", mode_tools::add_source);
    map.insert("index_fact", mode_tools::index_fact);
    map.insert("sources", mode_tools::sources);
    map.insert("facts", mode_tools::facts);

    map.insert("kanban_init", kanban_tools::kanban_init);
    map.insert("kanban", kanban_tools::kanban);
    map.insert("kanban_show", kanban_tools::kanban_show);
    map.insert("kanban_add", kanban_tools::kanban_add);
    map.insert("kanban_move", kanban_tools::kanban_move);
    map.insert("kanban_detail", kanban_tools::kanban_detail);
    map.insert("kanban_update", kanban_tools::kanban_update);
    map.insert("kanban_delete", kanban_tools::kanban_delete);
    map.insert("kanban_archive", kanban_tools::kanban_archive);
    map.insert("kanban_history", kanban_tools::kanban_history);

    map
}

/// Shared by handlers that just need to mutate state and mark it dirty.
pub(crate) async fn mark_dirty(app: &crate::state::AppState, project_id: &str) {
    app.projects.mark_dirty(project_id).await;
}
