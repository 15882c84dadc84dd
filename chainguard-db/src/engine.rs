use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbEngine {
    MySql,
    Postgres,
    Sqlite,
}

/// `^[A-Za-z_][A-Za-z0-9_]{0,127}$` (§4.9).
pub fn validate_identifier(ident: &str) -> Result<(), DbError> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$").map_err(|_| DbError::InvalidIdentifier(ident.to_string()))?;
    if re.is_match(ident) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(ident.to_string()))
    }
}

/// Engine-specific quoting: backticks for MySQL, double-quotes for
/// Postgres and SQLite (§4.9).
pub fn quote_identifier(engine: DbEngine, ident: &str) -> Result<String, DbError> {
    validate_identifier(ident)?;
    Ok(match engine {
        DbEngine::MySql => format!("`{ident}`"),
        DbEngine::Postgres | DbEngine::Sqlite => format!("\"{ident}\""),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_identifiers_with_sql_metacharacters() {
        assert!(validate_identifier("users; DROP TABLE x--").is_err());
        assert!(validate_identifier("users").is_ok());
    }

    #[test]
    fn quoting_is_engine_specific() {
        assert_eq!(quote_identifier(DbEngine::MySql, "users").unwrap(), "`users`");
        assert_eq!(quote_identifier(DbEngine::Postgres, "users").unwrap(), "\"users\"");
        assert_eq!(quote_identifier(DbEngine::Sqlite, "users").unwrap(), "\"users\"");
    }

    #[test]
    fn quoting_rejects_invalid_identifier() {
        assert!(quote_identifier(DbEngine::MySql, "1bad").is_err());
    }
}
