//! Document storage for interviews and feedback
//!
//! Provides the collection/document abstraction the rest of the crate is
//! written against, plus an in-memory and a libSQL implementation.

pub mod libsql;
pub mod memory;

use crate::error::{FeedbackError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Collection holding interview documents
pub const INTERVIEWS: &str = "interviews";

/// Collection holding feedback documents
pub const FEEDBACK: &str = "feedback";

/// A stored document: its id plus the JSON body
///
/// The id is not part of `data`; [`Document::decode`] injects it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Read a single field from the body
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Deserialize into a record type that carries an `id` field
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let Document { id, data } = self;
        let mut body = match data {
            Value::Object(map) => map,
            other => {
                return Err(FeedbackError::StoreRead(format!(
                    "Document {} is not an object: {}",
                    id, other
                )))
            }
        };
        body.insert("id".to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(body))
            .map_err(|e| FeedbackError::StoreRead(format!("Malformed document {}: {}", id, e)))
    }
}

/// Serialize a record into a document body, dropping its `id` field
pub fn to_document_data<T: Serialize>(record: &T) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

/// Comparison applied by a query filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// Matches documents whose field exists, is not null and differs
    Ne,
}

/// `field <op> value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Sort direction for ordered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering clause; documents lacking the field are excluded
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Filtered, optionally ordered and limited collection query
///
/// ```ignore
/// let query = Query::new()
///     .where_eq("finalized", true)
///     .where_ne("userId", "u1")
///     .order_by("createdAt", SortDirection::Descending)
///     .limit(20);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    pub fn where_ne(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Ne,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Document store trait defining all required operations
///
/// Implementations must be safe for concurrent use; callers perform no
/// locking of their own.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read; `None` when the document does not exist
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Create or fully replace the document at `id`
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Generate a fresh document id for `collection`
    fn new_id(&self, collection: &str) -> String;

    /// Run a filtered query
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;
}
