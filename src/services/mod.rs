//! Services layer for interview feedback
//!
//! Provides the structured completion boundary and its LLM integration.

pub mod completion;
pub mod llm;

pub use completion::{
    complete_structured, conform, CompletionClient, SchemaDescriptor, StructuredOutput,
};
pub use llm::{LlmConfig, LlmService};
