use thiserror::Error;

use crate::domain::agent_config::TenantId;

/// Turn-fatal failures. Each variant ends the current turn with a single
/// user-safe reply; the customer never sees the underlying message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("tenant `{0}` has no agent configuration")]
    NotConfigured(TenantId),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("persistence failure: {0}")]
    Store(String),
    #[error("model provider failure: {0}")]
    Provider(String),
    #[error("outbound dispatch failure: {0}")]
    Dispatch(String),
}

impl TurnError {
    /// Stable class label for logs and structured webhook responses.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NotConfigured(_) => "not_configured",
            Self::Configuration(_) => "configuration",
            Self::Store(_) => "store",
            Self::Provider(_) => "provider",
            Self::Dispatch(_) => "dispatch",
        }
    }

    /// The apology the customer receives when the turn cannot complete.
    /// `NotConfigured` is operator-facing and produces no customer reply.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::NotConfigured(_) => None,
            Self::Configuration(_) | Self::Store(_) | Self::Provider(_) => Some(
                "Sorry, I am having trouble right now. A member of our team \
                 will get back to you shortly.",
            ),
            Self::Dispatch(_) => None,
        }
    }
}

/// Failures inside a single tool call. Recoverable: fed back into the model
/// transcript as a failed tool result so the conversation can continue.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdapterError {
    #[error("scheduling conflict: {0}")]
    SchedulingConflict(String),
    #[error("unknown service: {0}")]
    UnknownService(String),
    #[error("invalid tool argument `{field}`: {reason}")]
    InvalidArgument { field: String, reason: String },
    #[error("tool `{0}` is not enabled for this tenant")]
    DisabledTool(String),
    #[error("store failure during tool call: {0}")]
    Store(String),
}

impl AdapterError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::SchedulingConflict(_) => "scheduling_conflict",
            Self::UnknownService(_) => "unknown_service",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::DisabledTool(_) => "disabled_tool",
            Self::Store(_) => "adapter_store",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::agent_config::TenantId;

    use super::{AdapterError, TurnError};

    #[test]
    fn fatal_errors_have_a_user_safe_apology() {
        let provider = TurnError::Provider("timeout after 30s".to_string());
        let message = provider.user_message().expect("provider failure should apologize");
        assert!(!message.contains("timeout"));
    }

    #[test]
    fn not_configured_produces_no_customer_reply() {
        let error = TurnError::NotConfigured(TenantId("t1".to_string()));
        assert!(error.user_message().is_none());
        assert_eq!(error.error_class(), "not_configured");
    }

    #[test]
    fn adapter_errors_carry_stable_classes() {
        let conflict = AdapterError::SchedulingConflict("14:00 taken".to_string());
        assert_eq!(conflict.error_class(), "scheduling_conflict");
        let argument = AdapterError::InvalidArgument {
            field: "date".to_string(),
            reason: "not ISO-8601".to_string(),
        };
        assert!(argument.to_string().contains("date"));
        let disabled = AdapterError::DisabledTool("create_quote".to_string());
        assert_eq!(disabled.error_class(), "disabled_tool");
    }
}
