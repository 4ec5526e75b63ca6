//! LibSQL document store
//!
//! Persists every collection in a single `documents` table keyed by
//! `(collection, id)`, with the body kept as JSON text. Query filters and
//! ordering compile to `json_type`/`json_extract` expressions; every field
//! path and value is bound as a parameter.

use crate::error::{FeedbackError, Result};
use crate::storage::{Document, DocumentStore, Filter, FilterOp, Query, SortDirection};
use crate::types::timestamp;
use ::libsql::{params, params_from_iter, Builder, Connection, Database, Value as SqlValue};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)
"#;

const UPSERT: &str = r#"
INSERT INTO documents (collection, id, data, updated_at)
VALUES (?, ?, ?, ?)
ON CONFLICT (collection, id) DO UPDATE SET
    data = excluded.data,
    updated_at = excluded.updated_at
"#;

/// Database connection mode
#[derive(Debug, Clone)]
pub enum ConnectionMode {
    /// Local file-based database
    Local(String),
    /// Remote database (Turso Cloud)
    Remote { url: String, token: String },
}

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// LibSQL-backed document store
pub struct LibsqlStore {
    db: Database,
    local: bool,
}

fn read_err(e: ::libsql::Error) -> FeedbackError {
    FeedbackError::StoreRead(e.to_string())
}

fn write_err(e: ::libsql::Error) -> FeedbackError {
    FeedbackError::StoreWrite(e.to_string())
}

impl LibsqlStore {
    /// Open (creating if needed) a store and ensure the schema exists
    pub async fn new(mode: ConnectionMode) -> Result<Self> {
        info!("Connecting to LibSQL document store: {:?}", redacted(&mode));

        let local = matches!(mode, ConnectionMode::Local(_));
        let db = match mode {
            ConnectionMode::Local(ref path) => {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Builder::new_local(path).build().await.map_err(|e| {
                    FeedbackError::Other(format!("Failed to open database {}: {}", path, e))
                })?
            }
            ConnectionMode::Remote { ref url, ref token } => {
                Builder::new_remote(url.clone(), token.clone())
                    .build()
                    .await
                    .map_err(|e| {
                        FeedbackError::Other(format!("Failed to connect to {}: {}", url, e))
                    })?
            }
        };

        let store = Self { db, local };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open a connection; local ones wait out concurrent writers
    fn connect(&self, kind: fn(String) -> FeedbackError) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| kind(format!("Failed to get connection: {}", e)))?;
        if self.local {
            conn.busy_timeout(BUSY_TIMEOUT)
                .map_err(|e| kind(format!("Failed to set busy timeout: {}", e)))?;
        }
        Ok(conn)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.connect(FeedbackError::StoreWrite)?;
        if self.local {
            // Persisted in the file; later connections inherit it
            let mut rows = conn
                .query("PRAGMA journal_mode=WAL", ())
                .await
                .map_err(write_err)?;
            while rows.next().await.map_err(write_err)?.is_some() {}
        }
        conn.execute(SCHEMA, params![]).await.map_err(write_err)?;
        debug!("Document schema ready");
        Ok(())
    }
}

fn redacted(mode: &ConnectionMode) -> String {
    match mode {
        ConnectionMode::Local(path) => format!("local:{}", path),
        ConnectionMode::Remote { url, .. } => format!("remote:{}", url),
    }
}

#[async_trait]
impl DocumentStore for LibsqlStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.connect(FeedbackError::StoreRead)?;
        let mut rows = conn
            .query(
                "SELECT data FROM documents WHERE collection = ? AND id = ?",
                params![collection.to_string(), id.to_string()],
            )
            .await
            .map_err(read_err)?;

        match rows.next().await.map_err(read_err)? {
            Some(row) => {
                let text: String = row.get(0).map_err(read_err)?;
                Ok(Some(Document::new(id, parse_body(id, &text)?)))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        debug!("Upserting {}/{}", collection, id);

        let body = serde_json::to_string(&data)
            .map_err(|e| FeedbackError::StoreWrite(format!("Unserializable document: {}", e)))?;
        let conn = self.connect(FeedbackError::StoreWrite)?;
        conn.execute(
            UPSERT,
            params![
                collection.to_string(),
                id.to_string(),
                body,
                timestamp::format(&Utc::now())
            ],
        )
        .await
        .map_err(write_err)?;
        Ok(())
    }

    fn new_id(&self, _collection: &str) -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let (sql, values) = compile_query(collection, query)?;
        debug!("Running query on {}: {}", collection, sql);

        let conn = self.connect(FeedbackError::StoreRead)?;
        let mut rows = conn
            .query(&sql, params_from_iter(values))
            .await
            .map_err(read_err)?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await.map_err(read_err)? {
            let id: String = row.get(0).map_err(read_err)?;
            let text: String = row.get(1).map_err(read_err)?;
            let data = parse_body(&id, &text)?;
            documents.push(Document::new(id, data));
        }
        Ok(documents)
    }
}

fn parse_body(id: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| FeedbackError::StoreRead(format!("Corrupt document {}: {}", id, e)))
}

fn json_path(field: &str) -> Result<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(FeedbackError::InvalidQuery(format!(
            "Unsupported field name: {:?}",
            field
        )));
    }
    Ok(format!("$.{}", field))
}

/// SQL condition that holds when `filter.field` equals `filter.value`
fn equality_clause(filter: &Filter, values: &mut Vec<SqlValue>) -> Result<String> {
    let path = json_path(&filter.field)?;
    let clause = match &filter.value {
        Value::Null => {
            values.push(SqlValue::Text(path));
            "json_type(data, ?) = 'null'".to_string()
        }
        Value::Bool(b) => {
            values.push(SqlValue::Text(path));
            format!("json_type(data, ?) = '{}'", b)
        }
        Value::Number(n) => {
            values.push(SqlValue::Text(path.clone()));
            values.push(SqlValue::Text(path));
            values.push(match n.as_i64() {
                Some(i) => SqlValue::Integer(i),
                None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            });
            "(json_type(data, ?) IN ('integer', 'real') AND json_extract(data, ?) = ?)".to_string()
        }
        Value::String(s) => {
            values.push(SqlValue::Text(path.clone()));
            values.push(SqlValue::Text(path));
            values.push(SqlValue::Text(s.clone()));
            "(json_type(data, ?) = 'text' AND json_extract(data, ?) = ?)".to_string()
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(FeedbackError::InvalidQuery(format!(
                "Cannot filter {} on a composite value",
                filter.field
            )))
        }
    };
    Ok(clause)
}

/// Translate a [`Query`] into SQL plus positional parameters
fn compile_query(collection: &str, query: &Query) -> Result<(String, Vec<SqlValue>)> {
    let mut values = vec![SqlValue::Text(collection.to_string())];
    let mut conditions = vec!["collection = ?".to_string()];

    for filter in &query.filters {
        let condition = match filter.op {
            FilterOp::Eq => equality_clause(filter, &mut values)?,
            FilterOp::Ne => {
                values.push(SqlValue::Text(json_path(&filter.field)?));
                let eq = equality_clause(filter, &mut values)?;
                format!("(json_type(data, ?) != 'null' AND NOT {})", eq)
            }
        };
        conditions.push(condition);
    }

    let order = match &query.order_by {
        Some(order) => {
            let path = json_path(&order.field)?;
            values.push(SqlValue::Text(path.clone()));
            conditions.push("json_type(data, ?) IS NOT NULL".to_string());
            values.push(SqlValue::Text(path));
            let direction = match order.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            format!("json_extract(data, ?) {}, id ASC", direction)
        }
        None => "id ASC".to_string(),
    };

    let mut sql = format!(
        "SELECT id, data FROM documents WHERE {} ORDER BY {}",
        conditions.join(" AND "),
        order
    );

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        values.push(SqlValue::Integer(limit as i64));
    }

    Ok((sql, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, LibsqlStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("documents.db");
        let store = LibsqlStore::new(ConnectionMode::Local(path.to_string_lossy().to_string()))
            .await
            .unwrap();
        (dir, store)
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_compile_query_placeholders_match_values() {
        let query = Query::new()
            .where_eq("finalized", true)
            .where_ne("userId", "u1")
            .order_by("createdAt", SortDirection::Descending)
            .limit(20);

        let (sql, values) = compile_query("interviews", &query).unwrap();
        assert_eq!(sql.matches('?').count(), values.len());
        assert!(sql.contains("ORDER BY json_extract(data, ?) DESC, id ASC"));
        assert!(sql.ends_with("LIMIT ?"));
        assert!(matches!(values.last(), Some(SqlValue::Integer(20))));
    }

    #[test]
    fn test_compile_query_rejects_unsafe_field() {
        let query = Query::new().where_eq("userId') OR 1=1 --", "u1");
        let err = compile_query("interviews", &query).unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidQuery(_)));
    }

    #[test]
    fn test_compile_query_rejects_composite_values() {
        let query = Query::new().where_eq("techStack", json!(["Rust"]));
        assert!(compile_query("interviews", &query).is_err());
    }

    #[tokio::test]
    async fn test_set_get_replace() {
        let (_dir, store) = temp_store().await;
        assert!(store.get("items", "x").await.unwrap().is_none());

        store.set("items", "x", json!({"v": 1, "old": true})).await.unwrap();
        store.set("items", "x", json!({"v": 2})).await.unwrap();

        let doc = store.get("items", "x").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let (_dir, store) = temp_store().await;
        store.set("a", "same", json!({"from": "a"})).await.unwrap();
        store.set("b", "same", json!({"from": "b"})).await.unwrap();

        let doc = store.get("b", "same").await.unwrap().unwrap();
        assert_eq!(doc.data["from"], "b");
        assert_eq!(store.query("a", &Query::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_filters_and_ordering() {
        let (_dir, store) = temp_store().await;
        store
            .set("items", "a", json!({"owner": "u1", "rank": 2, "open": true}))
            .await
            .unwrap();
        store
            .set("items", "b", json!({"owner": "u2", "rank": 10, "open": true}))
            .await
            .unwrap();
        store
            .set("items", "c", json!({"owner": "u1", "rank": 5, "open": false}))
            .await
            .unwrap();
        store
            .set("items", "d", json!({"rank": 1, "open": true}))
            .await
            .unwrap();

        let docs = store
            .query("items", &Query::new().where_ne("owner", "u1"))
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["b"]);

        let docs = store
            .query(
                "items",
                &Query::new()
                    .where_eq("open", true)
                    .order_by("rank", SortDirection::Descending),
            )
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["b", "a", "d"]);

        let docs = store
            .query(
                "items",
                &Query::new()
                    .where_eq("owner", "u1")
                    .order_by("rank", SortDirection::Ascending)
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["a"]);
    }
}
