//! LLM service for structured evaluations
//!
//! Implements [`CompletionClient`] on the Anthropic Messages API. The schema
//! is offered as the only tool and the model is forced to call it, so the
//! tool input is the structured object.

use crate::error::{FeedbackError, Result};
use crate::services::completion::{CompletionClient, SchemaDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use tracing::{debug, info};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for LLM service
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Anthropic API key
    pub api_key: String,

    /// Model to use (default: claude-3-5-haiku-20241022)
    pub model: String,

    /// Max tokens for responses
    pub max_tokens: usize,

    /// Temperature for sampling
    pub temperature: f32,

    /// Messages endpoint, overridable for proxies and tests
    pub endpoint: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: "claude-3-5-haiku-20241022".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// LLM service producing schema-constrained objects
pub struct LlmService {
    config: LlmConfig,
    client: reqwest::Client,
}

/// Anthropic API message format
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    ToolUse {
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl LlmService {
    /// Create a new LLM service with custom config
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(FeedbackError::Config(::config::ConfigError::Message(
                "ANTHROPIC_API_KEY not set".to_string(),
            )));
        }

        Ok(Self {
            config,
            client: reqwest::Client::new(),
        })
    }

    /// Create with default config
    pub fn with_default() -> Result<Self> {
        Self::new(LlmConfig::default())
    }

    fn build_request<'a>(
        &'a self,
        system_instruction: &'a str,
        prompt: &'a str,
        schema: &'a SchemaDescriptor,
    ) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: system_instruction,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            tools: vec![Tool {
                name: &schema.name,
                description: &schema.description,
                input_schema: &schema.schema,
            }],
            tool_choice: ToolChoice {
                kind: "tool",
                name: &schema.name,
            },
        }
    }
}

/// Pull the forced tool call's input out of a response
fn extract_tool_input(response: AnthropicResponse, schema: &SchemaDescriptor) -> Result<Value> {
    let input = response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input } if name == schema.name => Some(input),
            _ => None,
        })
        .ok_or_else(|| {
            FeedbackError::Completion(format!("Response carried no {} object", schema.name))
        })?;

    if !input.is_object() {
        return Err(FeedbackError::Completion(format!(
            "{} output is not a JSON object",
            schema.name
        )));
    }
    Ok(input)
}

#[async_trait]
impl CompletionClient for LlmService {
    async fn complete(
        &self,
        system_instruction: &str,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Value> {
        debug!("Calling Anthropic API for {}", schema.name);

        let request = self.build_request(system_instruction, prompt, schema);
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FeedbackError::Completion(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| FeedbackError::Completion(format!("Failed to parse response: {}", e)))?;

        let input = extract_tool_input(api_response, schema)?;
        info!("Received structured {} from {}", schema.name, self.config.model);
        Ok(input)
    }
}
