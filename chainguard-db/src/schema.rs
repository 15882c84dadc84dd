use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::DbError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub foreign_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub approx_row_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<TableInfo>,
    pub fetched_at: DateTime<Utc>,
}

pub async fn fetch_mysql(pool: &sqlx::MySqlPool) -> Result<Schema, DbError> {
    let table_rows = sqlx::query("SHOW TABLES").fetch_all(pool).await?;
    let mut tables = Vec::with_capacity(table_rows.len());

    for row in table_rows {
        let name: String = row.try_get(0)?;
        let column_rows = sqlx::query(&format!("SHOW COLUMNS FROM `{name}`")).fetch_all(pool).await?;
        let columns = column_rows
            .into_iter()
            .map(|c| -> Result<ColumnInfo, DbError> {
                let field: String = c.try_get("Field")?;
                let data_type: String = c.try_get("Type")?;
                let null: String = c.try_get("Null")?;
                let key: String = c.try_get("Key")?;
                Ok(ColumnInfo {
                    name: field,
                    data_type,
                    nullable: null == "YES",
                    is_primary_key: key == "PRI",
                    is_unique: key == "UNI" || key == "PRI",
                    foreign_key: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let approx_row_count = sqlx::query(&format!("SELECT COUNT(*) FROM `{name}`"))
            .fetch_one(pool)
            .await
            .ok()
            .and_then(|r| r.try_get::<i64, _>(0).ok());

        tables.push(TableInfo { name, columns, approx_row_count });
    }

    Ok(Schema { tables, fetched_at: Utc::now() })
}

pub async fn fetch_postgres(pool: &sqlx::PgPool) -> Result<Schema, DbError> {
    let table_rows = sqlx::query(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_all(pool)
    .await?;

    let mut tables = Vec::with_capacity(table_rows.len());
    for row in table_rows {
        let name: String = row.try_get("table_name")?;
        let column_rows = sqlx::query(
            "SELECT column_name, data_type, is_nullable FROM information_schema.columns \
             WHERE table_name = $1 ORDER BY ordinal_position",
        )
        .bind(&name)
        .fetch_all(pool)
        .await?;

        let pk_rows = sqlx::query(
            "SELECT a.attname FROM pg_index i \
             JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
             WHERE i.indrelid = $1::regclass AND i.indisprimary",
        )
        .bind(&name)
        .fetch_all(pool)
        .await
        .unwrap_or_default();
        let pk_names: std::collections::HashSet<String> =
            pk_rows.into_iter().filter_map(|r| r.try_get::<String, _>(0).ok()).collect();

        let columns = column_rows
            .into_iter()
            .map(|c| -> Result<ColumnInfo, DbError> {
                let column_name: String = c.try_get("column_name")?;
                let data_type: String = c.try_get("data_type")?;
                let is_nullable: String = c.try_get("is_nullable")?;
                let is_pk = pk_names.contains(&column_name);
                Ok(ColumnInfo {
                    name: column_name,
                    data_type,
                    nullable: is_nullable == "YES",
                    is_primary_key: is_pk,
                    is_unique: is_pk,
                    foreign_key: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let approx_row_count = sqlx::query(&format!("SELECT COUNT(*) FROM \"{name}\""))
            .fetch_one(pool)
            .await
            .ok()
            .and_then(|r| r.try_get::<i64, _>(0).ok());

        tables.push(TableInfo { name, columns, approx_row_count });
    }

    Ok(Schema { tables, fetched_at: Utc::now() })
}

pub async fn fetch_sqlite(pool: &sqlx::SqlitePool) -> Result<Schema, DbError> {
    let table_rows =
        sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .fetch_all(pool)
            .await?;

    let mut tables = Vec::with_capacity(table_rows.len());
    for row in table_rows {
        let name: String = row.try_get("name")?;
        let column_rows = sqlx::query(&format!("PRAGMA table_info(\"{name}\")")).fetch_all(pool).await?;

        let columns = column_rows
            .into_iter()
            .map(|c| -> Result<ColumnInfo, DbError> {
                let column_name: String = c.try_get("name")?;
                let data_type: String = c.try_get("type")?;
                let notnull: i64 = c.try_get("notnull")?;
                let pk: i64 = c.try_get("pk")?;
                Ok(ColumnInfo {
                    name: column_name,
                    data_type,
                    nullable: notnull == 0,
                    is_primary_key: pk > 0,
                    is_unique: pk > 0,
                    foreign_key: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let approx_row_count = sqlx::query(&format!("SELECT COUNT(*) FROM \"{name}\""))
            .fetch_one(pool)
            .await
            .ok()
            .and_then(|r| r.try_get::<i64, _>(0).ok());

        tables.push(TableInfo { name, columns, approx_row_count });
    }

    Ok(Schema { tables, fetched_at: Utc::now() })
}

/// Renders the compact tree described in §4.9:
/// `table (N cols, ~R rows)` followed by per-column lines.
pub fn format_schema(schema: &Schema) -> String {
    let mut out = String::new();
    for table in &schema.tables {
        let rows = table
            .approx_row_count
            .map(|r| format!("~{r} rows"))
            .unwrap_or_else(|| "unknown rows".to_string());
        out.push_str(&format!("{} ({} cols, {})\n", table.name, table.columns.len(), rows));
        for column in &table.columns {
            let mut annotations = Vec::new();
            if column.is_primary_key {
                annotations.push("PK");
            }
            if column.is_unique && !column.is_primary_key {
                annotations.push("UNIQUE");
            }
            if let Some(fk) = &column.foreign_key {
                out.push_str(&format!(
                    "  {} {}{}  FK -> {fk}\n",
                    column.name,
                    column.data_type,
                    if column.nullable { "" } else { " NOT NULL" }
                ));
                continue;
            }
            let suffix = if annotations.is_empty() {
                String::new()
            } else {
                format!(" [{}]", annotations.join(", "))
            };
            out.push_str(&format!(
                "  {} {}{}{suffix}\n",
                column.name,
                column.data_type,
                if column.nullable { "" } else { " NOT NULL" }
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_table_with_pk_and_nullable_column() {
        let schema = Schema {
            tables: vec![TableInfo {
                name: "users".to_string(),
                columns: vec![
                    ColumnInfo {
                        name: "id".to_string(),
                        data_type: "integer".to_string(),
                        nullable: false,
                        is_primary_key: true,
                        is_unique: true,
                        foreign_key: None,
                    },
                    ColumnInfo {
                        name: "email".to_string(),
                        data_type: "varchar".to_string(),
                        nullable: true,
                        is_primary_key: false,
                        is_unique: true,
                        foreign_key: None,
                    },
                ],
                approx_row_count: Some(42),
            }],
            fetched_at: Utc::now(),
        };

        let rendered = format_schema(&schema);
        assert!(rendered.starts_with("users (2 cols, ~42 rows)"));
        assert!(rendered.contains("id integer NOT NULL [PK]"));
        assert!(rendered.contains("email varchar [UNIQUE]"));
    }
}
