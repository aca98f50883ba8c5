//! Vendor-neutral chat abstraction.
//!
//! The orchestrator speaks one shape regardless of vendor: a transcript of
//! entries, a tool list, and a model turn that is either text or tool calls.
//! Vendor dialects live entirely inside the provider implementations.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("api error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

/// One tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Outcome of one executed tool call, fed back into the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOutcome {
    pub call_id: String,
    pub name: String,
    pub content: Value,
    pub is_error: bool,
}

/// Transcript entry in orchestrator terms. Providers render these into their
/// own wire shapes, including the vendor-specific tool-call encodings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptEntry {
    User(String),
    Assistant(String),
    ToolCalls(Vec<ToolCallRequest>),
    ToolOutcomes(Vec<ToolOutcome>),
}

/// A tool offered to the model: name, what it does, and a JSON Schema for its
/// arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Everything a provider needs for one model call.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub transcript: Vec<TranscriptEntry>,
    pub tools: Vec<ToolDeclaration>,
}

/// What the model decided to do with its turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelTurn {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn send_turn(&self, request: &ChatRequest) -> Result<ModelTurn, ProviderError>;
}
