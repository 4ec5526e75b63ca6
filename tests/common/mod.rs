//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use interview_feedback::{
    error::{FeedbackError, Result},
    services::SchemaDescriptor,
    storage::{to_document_data, Document, Query, INTERVIEWS},
    types::timestamp,
    CompletionClient, DocumentStore, InMemoryStore, Interview, InterviewId, UserId,
};
use mockall::mock;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mock! {
    pub Store {}

    #[async_trait]
    impl DocumentStore for Store {
        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;
        async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;
        fn new_id(&self, collection: &str) -> String;
        async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>>;
    }
}

/// Completion client that always answers with the same value
pub struct FixedCompletion {
    response: Value,
    calls: AtomicUsize,
}

impl FixedCompletion {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for FixedCompletion {
    async fn complete(
        &self,
        _system_instruction: &str,
        _prompt: &str,
        _schema: &SchemaDescriptor,
    ) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Completion client whose every call fails
pub struct FailingCompletion;

#[async_trait]
impl CompletionClient for FailingCompletion {
    async fn complete(
        &self,
        _system_instruction: &str,
        _prompt: &str,
        _schema: &SchemaDescriptor,
    ) -> Result<Value> {
        Err(FeedbackError::Completion(
            "API request failed with status 529: overloaded".to_string(),
        ))
    }
}

/// A conforming assessment
pub fn assessment_json() -> Value {
    json!({
        "totalScore": 72,
        "categoryScores": {
            "Communication Skills": 78,
            "Technical Knowledge": 70,
            "Problem-Solving": 65,
            "Cultural & Role Fit": 80,
            "Confidence & Clarity": 67
        },
        "strengths": ["Explains trade-offs clearly", "Good ownership examples"],
        "areasForImprovement": ["Practice system design depth"],
        "finalAssessment": "Strong communicator with room to grow technically."
    })
}

/// Build an interview with a `YYYY-MM-DD` creation date
pub fn interview(id: &str, user: &str, finalized: bool, created: &str) -> Interview {
    Interview {
        id: InterviewId::from(id),
        user_id: UserId::from(user),
        role: "Backend Engineer".to_string(),
        level: Some("Mid".to_string()),
        interview_type: Some("Technical".to_string()),
        tech_stack: vec!["Rust".to_string(), "PostgreSQL".to_string()],
        questions: vec!["Describe a system you designed.".to_string()],
        finalized,
        created_at: timestamp::parse(created).expect("valid test date"),
        cover_image: Some("/covers/spotify.png".to_string()),
    }
}

/// Write interviews into any store
pub async fn seed(store: &dyn DocumentStore, interviews: &[Interview]) {
    for interview in interviews {
        store
            .set(
                INTERVIEWS,
                interview.id.as_str(),
                to_document_data(interview).unwrap(),
            )
            .await
            .unwrap();
    }
}

/// The three-interview scenario: i1 (u1, final), i2 (u2, final), i3 (u1, draft)
pub fn scenario() -> Vec<Interview> {
    vec![
        interview("i1", "u1", true, "2024-01-02"),
        interview("i2", "u2", true, "2024-01-03"),
        interview("i3", "u1", false, "2024-01-04"),
    ]
}

/// The same scenario as raw stored bodies with bare `createdAt` dates
pub fn scenario_documents() -> Vec<(&'static str, Value)> {
    vec![
        (
            "i1",
            json!({"userId": "u1", "role": "Backend Engineer", "techStack": ["Rust"],
                   "finalized": true, "createdAt": "2024-01-02"}),
        ),
        (
            "i2",
            json!({"userId": "u2", "role": "Frontend Developer", "techStack": ["React"],
                   "finalized": true, "createdAt": "2024-01-03"}),
        ),
        (
            "i3",
            json!({"userId": "u1", "role": "Backend Engineer", "techStack": ["Go"],
                   "finalized": false, "createdAt": "2024-01-04"}),
        ),
    ]
}

/// Write raw bodies into any store
pub async fn seed_documents(store: &dyn DocumentStore, documents: Vec<(&str, Value)>) {
    for (id, data) in documents {
        store.set(INTERVIEWS, id, data).await.unwrap();
    }
}

/// In-memory store preloaded with [`scenario_documents`]
pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    seed_documents(store.as_ref(), scenario_documents()).await;
    store
}

pub fn ids(interviews: &[Interview]) -> Vec<&str> {
    interviews.iter().map(|i| i.id.as_str()).collect()
}
