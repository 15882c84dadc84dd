use serde::{Deserialize, Serialize};

use crate::DbEngine;

/// What `db_connect` stores for a project (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub engine: DbEngine,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// Only meaningful for `DbEngine::Sqlite`.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

impl DbConfig {
    pub fn connection_url(&self) -> String {
        match self.engine {
            DbEngine::Sqlite => {
                format!("sqlite://{}", self.sqlite_path.clone().unwrap_or_else(|| ":memory:".to_string()))
            }
            DbEngine::MySql => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.user.as_deref().unwrap_or(""),
                self.password.as_deref().unwrap_or(""),
                self.host.as_deref().unwrap_or("127.0.0.1"),
                self.port.unwrap_or(3306),
                self.database.as_deref().unwrap_or(""),
            ),
            DbEngine::Postgres => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user.as_deref().unwrap_or(""),
                self.password.as_deref().unwrap_or(""),
                self.host.as_deref().unwrap_or("127.0.0.1"),
                self.port.unwrap_or(5432),
                self.database.as_deref().unwrap_or(""),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_url_defaults_to_in_memory() {
        let config = DbConfig {
            engine: DbEngine::Sqlite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            sqlite_path: None,
        };
        assert_eq!(config.connection_url(), "sqlite://:memory:");
    }

    #[test]
    fn mysql_url_uses_defaults_for_missing_fields() {
        let config = DbConfig {
            engine: DbEngine::MySql,
            host: None,
            port: None,
            user: Some("root".into()),
            password: None,
            database: Some("app".into()),
            sqlite_path: None,
        };
        assert_eq!(config.connection_url(), "mysql://root:@127.0.0.1:3306/app");
    }
}
