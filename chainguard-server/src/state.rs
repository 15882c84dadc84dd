use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;

use chainguard_core::{ProjectManager, Settings};
use chainguard_db::{Connection, SchemaCache};
use chainguard_http::SessionManager;

/// Everything a tool handler needs, shared behind an `Arc` across the
/// lifetime of one `chainguard-server` process.
pub struct AppState {
    pub projects: ProjectManager,
    pub settings: Settings,
    pub http_sessions: Mutex<SessionManager>,
    pub db_connections: Mutex<HashMap<String, Connection>>,
    pub db_schema_cache: Mutex<SchemaCache>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let home: PathBuf = settings.chainguard_home.clone();
        Self {
            projects: ProjectManager::new(home, settings.project_cache_capacity, settings.debounce_window),
            settings,
            http_sessions: Mutex::new(SessionManager::new()),
            db_connections: Mutex::new(HashMap::new()),
            db_schema_cache: Mutex::new(SchemaCache::new()),
        }
    }
}
