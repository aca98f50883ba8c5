use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hours::WeekSchedule;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which large-language-model vendor drives a tenant's agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmVendor {
    OpenAi,
    Anthropic,
}

impl LlmVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// Which WhatsApp Business API style a tenant sends replies through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhatsAppProvider {
    Twilio,
    MetaCloud,
}

impl WhatsAppProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twilio => "twilio",
            Self::MetaCloud => "meta_cloud",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "twilio" => Some(Self::Twilio),
            "meta_cloud" | "meta" => Some(Self::MetaCloud),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Per-tenant agent configuration, edited by workshop admins.
///
/// Loaded fresh for every turn rather than cached: admins change prices and
/// hours between customer messages and the next reply must reflect that.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TenantAgentConfig {
    pub tenant_id: TenantId,
    pub enabled: bool,
    pub vendor: LlmVendor,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub business_hours_only: bool,
    pub auto_schedule_appointments: bool,
    pub auto_create_orders: bool,
    pub require_human_approval: bool,
    pub business_hours: WeekSchedule,
    pub services: Vec<ServiceOffering>,
    #[serde(default)]
    pub policies: String,
    #[serde(default)]
    pub faqs: Vec<FaqEntry>,
    pub whatsapp_provider: WhatsAppProvider,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_slot_minutes() -> u32 {
    60
}

fn default_tax_rate() -> Decimal {
    crate::quoting::DEFAULT_TAX_RATE
}

fn default_history_limit() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::{LlmVendor, WhatsAppProvider};

    #[test]
    fn vendor_parse_round_trips() {
        for vendor in [LlmVendor::OpenAi, LlmVendor::Anthropic] {
            assert_eq!(LlmVendor::parse(vendor.as_str()), Some(vendor));
        }
        assert_eq!(LlmVendor::parse("cohere"), None);
    }

    #[test]
    fn whatsapp_provider_accepts_meta_alias() {
        assert_eq!(WhatsAppProvider::parse("meta"), Some(WhatsAppProvider::MetaCloud));
        assert_eq!(WhatsAppProvider::parse("TWILIO"), Some(WhatsAppProvider::Twilio));
        assert_eq!(WhatsAppProvider::parse("smtp"), None);
    }
}
