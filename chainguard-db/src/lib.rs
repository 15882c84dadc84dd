//! Multi-engine DB inspector (§4.9): connects to mysql/postgres/sqlite,
//! fetches a compact schema tree, and caches it per project with a TTL.
//!
//! The teacher's `db/connection.rs` is sqlite-only (rusqlite + r2d2); this
//! crate needs mysql and postgres too, so schema access goes through `sqlx`
//! instead (documented as a stack deviation, see the workspace DESIGN.md).

mod config;
mod engine;
mod schema;

pub use config::DbConfig;
pub use engine::DbEngine;
pub use schema::{ColumnInfo, Schema, TableInfo};

use std::time::Duration;

use thiserror::Error;

use chainguard_core::cache::TtlLruCache;

pub const SCHEMA_CACHE_TTL: Duration = Duration::from_secs(300);
const SCHEMA_CACHE_CAPACITY: usize = 20;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("no connection stored for this project")]
    NotConnected,
}

pub enum Connection {
    MySql(sqlx::MySqlPool),
    Postgres(sqlx::PgPool),
    Sqlite(sqlx::SqlitePool),
}

impl Connection {
    pub fn engine(&self) -> DbEngine {
        match self {
            Connection::MySql(_) => DbEngine::MySql,
            Connection::Postgres(_) => DbEngine::Postgres,
            Connection::Sqlite(_) => DbEngine::Sqlite,
        }
    }
}

pub async fn connect(config: &DbConfig) -> Result<Connection, DbError> {
    match config.engine {
        DbEngine::MySql => Ok(Connection::MySql(sqlx::MySqlPool::connect(&config.connection_url()).await?)),
        DbEngine::Postgres => {
            Ok(Connection::Postgres(sqlx::PgPool::connect(&config.connection_url()).await?))
        }
        DbEngine::Sqlite => Ok(Connection::Sqlite(sqlx::SqlitePool::connect(&config.connection_url()).await?)),
    }
}

/// Fetches every table and column for the connected database. Per-engine
/// queries hit `information_schema` (mysql/postgres) or `sqlite_master` +
/// `PRAGMA table_info` (sqlite).
pub async fn fetch_schema(conn: &Connection) -> Result<Schema, DbError> {
    match conn {
        Connection::MySql(pool) => schema::fetch_mysql(pool).await,
        Connection::Postgres(pool) => schema::fetch_postgres(pool).await,
        Connection::Sqlite(pool) => schema::fetch_sqlite(pool).await,
    }
}

/// Per-project cache of the last fetched `Schema`, keyed so `get_schema`
/// can serve a cached tree within the TTL and a fresh one past it (§4.9).
pub struct SchemaCache {
    entries: TtlLruCache<String, Schema>,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    pub fn new() -> Self {
        Self { entries: TtlLruCache::new(SCHEMA_CACHE_CAPACITY, SCHEMA_CACHE_TTL) }
    }

    /// Returns the cached schema for `project_id` if still fresh and
    /// `force_refresh` is false.
    pub fn cached(&mut self, project_id: &str, force_refresh: bool) -> Option<&Schema> {
        if force_refresh {
            return None;
        }
        self.entries.get(&project_id.to_string())
    }

    pub fn store(&mut self, project_id: &str, schema: Schema) {
        self.entries.put(project_id.to_string(), schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn fresh_cache_entry_is_returned() {
        let mut cache = SchemaCache::new();
        cache.store("proj1", Schema { tables: vec![], fetched_at: Utc::now() });
        assert!(cache.cached("proj1", false).is_some());
    }

    #[test]
    fn force_refresh_bypasses_cache() {
        let mut cache = SchemaCache::new();
        cache.store("proj1", Schema { tables: vec![], fetched_at: Utc::now() });
        assert!(cache.cached("proj1", true).is_none());
    }
}
