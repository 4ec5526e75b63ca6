//! Interview Feedback - mock interview evaluation pipeline
//!
//! Turns a finished mock-interview transcript into a structured, scored
//! feedback record and serves the read-side views built on top of it:
//! - Transcript normalization into a prompt-ready block
//! - Schema-constrained LLM assessment over five fixed categories
//! - Feedback upserts into a document store
//! - Interview and feedback lookups, the cross-user feed and per-user history
//!
//! # Architecture
//!
//! - **Types**: Interviews, feedback records, scores and ids
//! - **Storage**: Document store trait with in-memory and libSQL backends
//! - **Services**: Structured completion boundary and the Anthropic client
//! - **Synthesis / Queries**: The write and read paths
//!
//! # Example
//!
//! ```ignore
//! use interview_feedback::{
//!     FeedbackSynthesizer, InMemoryStore, InterviewQueries, LlmService, SynthesisRequest,
//!     TranscriptEntry,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let llm = Arc::new(LlmService::with_default()?);
//!
//!     let synthesizer = FeedbackSynthesizer::new(llm, store.clone());
//!     let feedback_id = synthesizer
//!         .synthesize(SynthesisRequest {
//!             interview_id: "i1".into(),
//!             user_id: "u1".into(),
//!             transcript: vec![TranscriptEntry::candidate("I led the migration.")],
//!             existing_feedback_id: None,
//!         })
//!         .await?;
//!
//!     let queries = InterviewQueries::new(store);
//!     let feedback = queries.get_feedback(&"i1".into(), &"u1".into()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod import;
pub mod queries;
pub mod services;
pub mod storage;
pub mod synthesis;
pub mod tech;
pub mod transcript;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{FeedbackError, Result};
pub use queries::{InterviewQueries, DEFAULT_FEED_LIMIT};
pub use services::{CompletionClient, LlmConfig, LlmService};
pub use storage::{
    libsql::{ConnectionMode, LibsqlStore},
    memory::InMemoryStore,
    DocumentStore,
};
pub use synthesis::{FeedbackSynthesizer, SynthesisRequest};
pub use types::{
    Category, CategoryScores, Feedback, FeedbackId, Interview, InterviewId, Score, SpeakerRole,
    TranscriptEntry, UserId,
};
