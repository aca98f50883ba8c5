//! Conversational agent runtime.
//!
//! One inbound WhatsApp message runs one turn: resolve the conversation,
//! render a grounded prompt from the tenant's config, loop the model over a
//! capability-gated tool set, and send back exactly one reply. Every side
//! effect the model requests passes through an adapter that re-validates it
//! against the store.

pub mod adapters;
pub mod context;
pub mod llm;
pub mod orchestrator;
pub mod providers;
pub mod tools;

pub use context::{ConversationGateway, ResolvedTurn};
pub use llm::{
    ChatProvider, ChatRequest, ModelTurn, ProviderError, ToolCallRequest, ToolDeclaration,
    ToolOutcome, TranscriptEntry,
};
pub use orchestrator::{Orchestrator, TurnOutcome, MAX_TOOL_ROUNDS};
pub use providers::{AnthropicProvider, ChatProviderFactory, OpenAiProvider, StaticProviderFactory};
pub use tools::{visible_tools, ToolContext, ToolRouter};
