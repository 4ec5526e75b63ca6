//! Structured completion boundary
//!
//! A [`CompletionClient`] returns a raw JSON object for a declared
//! [`SchemaDescriptor`]. [`complete_structured`] is the validation step that
//! turns that object into a typed value or a failure; nothing downstream ever
//! sees unvalidated model output.

use crate::error::{FeedbackError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Named JSON schema describing the object a completion must return
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// Top-level fields listed under `required`
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Cheap structural pre-check: an object carrying every required field
    pub fn check_shape(&self, value: &Value) -> std::result::Result<(), String> {
        let object = value
            .as_object()
            .ok_or_else(|| format!("{} output is not a JSON object", self.name))?;

        let missing: Vec<&str> = self
            .required_fields()
            .into_iter()
            .filter(|field| !object.contains_key(*field))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "{} output is missing required fields: {}",
                self.name,
                missing.join(", ")
            ))
        }
    }
}

/// Output type that can be requested from a structured completion
pub trait StructuredOutput: DeserializeOwned + Send {
    fn schema() -> SchemaDescriptor;
}

/// Generative model constrained to a declared output schema
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return an object for `schema`, or fail; never free text
    async fn complete(
        &self,
        system_instruction: &str,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Value>;
}

/// Validate raw completion output against `T`
///
/// Missing fields, extra categories, wrong types and out-of-range scores all
/// fail here; the value is never coerced.
pub fn conform<T: StructuredOutput>(value: Value) -> Result<T> {
    let schema = T::schema();
    schema.check_shape(&value).map_err(FeedbackError::Completion)?;

    serde_json::from_value(value).map_err(|e| {
        warn!("Completion output rejected by {} schema: {}", schema.name, e);
        FeedbackError::Completion(format!("Non-conformant {} output: {}", schema.name, e))
    })
}

/// Request a completion for `T` and validate it
pub async fn complete_structured<T: StructuredOutput>(
    client: &dyn CompletionClient,
    system_instruction: &str,
    prompt: &str,
) -> Result<T> {
    let schema = T::schema();
    debug!("Requesting structured completion: {}", schema.name);

    let value = client.complete(system_instruction, prompt, &schema).await?;
    conform(value)
}
