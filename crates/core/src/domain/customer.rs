use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent_config::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical phone form used for customer and conversation lookups.
///
/// Strips the `whatsapp:` transport prefix and all separators, keeping one
/// leading `+`. Transports re-format from this canonical form on send.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed.strip_prefix("whatsapp:").unwrap_or(trimmed);
    let digits: String =
        without_scheme.chars().filter(|character| character.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    format!("+{digits}")
}
