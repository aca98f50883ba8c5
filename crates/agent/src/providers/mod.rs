use std::sync::Arc;

use tallerbot_core::domain::agent_config::LlmVendor;

use crate::llm::ChatProvider;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Picks the provider for a tenant's configured vendor. Tenants choose per
/// config record, so the choice is made per turn. A vendor with no wired
/// client yields `None` and the turn fails as a configuration error before
/// any provider call.
pub trait ChatProviderFactory: Send + Sync {
    fn for_vendor(&self, vendor: LlmVendor) -> Option<Arc<dyn ChatProvider>>;
}

pub struct StaticProviderFactory {
    openai: Option<Arc<dyn ChatProvider>>,
    anthropic: Option<Arc<dyn ChatProvider>>,
}

impl StaticProviderFactory {
    /// `None` for a vendor means no credential was configured for it.
    pub fn new(
        openai: Option<Arc<dyn ChatProvider>>,
        anthropic: Option<Arc<dyn ChatProvider>>,
    ) -> Self {
        Self { openai, anthropic }
    }

    /// Both vendors served by the same provider. Test wiring.
    pub fn uniform(provider: Arc<dyn ChatProvider>) -> Self {
        Self { openai: Some(provider.clone()), anthropic: Some(provider) }
    }
}

impl ChatProviderFactory for StaticProviderFactory {
    fn for_vendor(&self, vendor: LlmVendor) -> Option<Arc<dyn ChatProvider>> {
        match vendor {
            LlmVendor::OpenAi => self.openai.clone(),
            LlmVendor::Anthropic => self.anthropic.clone(),
        }
    }
}
