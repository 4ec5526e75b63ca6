//! Interview seeding
//!
//! Interviews are created by an external generation flow; this is the local
//! way to load them. Records are normalized before they are written so that
//! the store only ever holds canonical timestamps.

use crate::error::{FeedbackError, Result};
use crate::storage::{to_document_data, DocumentStore, INTERVIEWS};
use crate::tech::random_interview_cover;
use crate::types::{timestamp, Interview, InterviewId};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

/// Write each record as an interview document
///
/// Missing `id`, `createdAt` and `coverImage` are filled in. A supplied
/// `createdAt` may be any RFC 3339 value or a bare date and is rewritten in
/// the stored form.
pub async fn import_interviews(
    store: &dyn DocumentStore,
    records: Vec<Value>,
) -> Result<Vec<InterviewId>> {
    let mut imported = Vec::with_capacity(records.len());

    for record in records {
        let Value::Object(fields) = record else {
            return Err(FeedbackError::Other(
                "Each imported interview must be a JSON object".to_string(),
            ));
        };

        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => store.new_id(INTERVIEWS),
        };
        let interview = normalize_record(id.clone(), fields)?;

        store
            .set(INTERVIEWS, &id, to_document_data(&interview)?)
            .await?;
        debug!("Imported interview {} ({})", id, interview.role);
        imported.push(interview.id);
    }

    Ok(imported)
}

fn normalize_record(id: String, mut fields: Map<String, Value>) -> Result<Interview> {
    let created_at = match fields.get("createdAt") {
        None | Some(Value::Null) => Utc::now(),
        Some(Value::String(raw)) => timestamp::parse(raw).ok_or_else(|| {
            FeedbackError::Other(format!("Interview {} has invalid createdAt {:?}", id, raw))
        })?,
        Some(other) => {
            return Err(FeedbackError::Other(format!(
                "Interview {} has invalid createdAt {}",
                id, other
            )))
        }
    };

    fields.insert("id".to_string(), Value::String(id));
    fields.insert(
        "createdAt".to_string(),
        Value::String(timestamp::format(&created_at)),
    );
    fields
        .entry("coverImage")
        .or_insert_with(|| Value::String(random_interview_cover()));

    Ok(serde_json::from_value(Value::Object(fields))?)
}
