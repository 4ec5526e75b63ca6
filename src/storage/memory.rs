//! In-memory document store
//!
//! Holds every collection in a `BTreeMap` behind a tokio `RwLock`. Query
//! semantics mirror the libSQL backend: `Ne` filters and ordering skip
//! documents that lack the field, values of different JSON types order by
//! type rank, and ties keep id order.

use crate::error::Result;
use crate::storage::{Document, DocumentStore, Filter, FilterOp, Query, SortDirection};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

type Collection = BTreeMap<String, Value>;

/// Document store kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        debug!("Setting {}/{}", collection, id);
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    fn new_id(&self, _collection: &str) -> String {
        Uuid::new_v4().simple().to_string()
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .filter(|(_, data)| query.filters.iter().all(|f| matches_filter(data, f)))
            .filter(|(_, data)| {
                query
                    .order_by
                    .as_ref()
                    .map_or(true, |o| data.get(&o.field).is_some())
            })
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .collect();

        if let Some(order) = &query.order_by {
            matched.sort_by(|a, b| {
                let ordering = compare_values(
                    a.field(&order.field).unwrap_or(&Value::Null),
                    b.field(&order.field).unwrap_or(&Value::Null),
                );
                match order.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        debug!(
            "Query on {} matched {} of {} documents",
            collection,
            matched.len(),
            docs.len()
        );
        Ok(matched)
    }
}

fn matches_filter(data: &Value, filter: &Filter) -> bool {
    let field = data.get(&filter.field);
    match filter.op {
        FilterOp::Eq => field.map_or(false, |v| compare_values(v, &filter.value).is_eq()),
        FilterOp::Ne => match field {
            None | Some(Value::Null) => false,
            Some(v) => !compare_values(v, &filter.value).is_eq(),
        },
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: by type rank, then by value
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ordering = compare_values(l, r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
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
        store
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_get_and_replace() {
        let store = InMemoryStore::new();
        assert!(store.get("items", "x").await.unwrap().is_none());

        store.set("items", "x", json!({"v": 1, "old": true})).await.unwrap();
        store.set("items", "x", json!({"v": 2})).await.unwrap();

        let doc = store.get("items", "x").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"v": 2}));
        assert_eq!(store.len("items").await, 1);
    }

    #[tokio::test]
    async fn test_new_ids_are_unique() {
        let store = InMemoryStore::new();
        let a = store.new_id("items");
        let b = store.new_id("items");
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[tokio::test]
    async fn test_eq_filter() {
        let store = seeded().await;
        let docs = store
            .query("items", &Query::new().where_eq("owner", "u1"))
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_ne_filter_skips_missing_field() {
        let store = seeded().await;
        let docs = store
            .query("items", &Query::new().where_ne("owner", "u1"))
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["b"]);
    }

    #[tokio::test]
    async fn test_numeric_order_and_limit() {
        let store = seeded().await;
        let query = Query::new()
            .where_eq("open", true)
            .order_by("rank", SortDirection::Descending)
            .limit(2);
        let docs = store.query("items", &query).await.unwrap();
        assert_eq!(ids(&docs), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let store = InMemoryStore::new();
        let docs = store.query("nothing", &Query::new()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_compare_values_by_type_rank() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(3), &json!("3")), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(2.0)), Ordering::Equal);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Ordering::Greater);
    }
}
