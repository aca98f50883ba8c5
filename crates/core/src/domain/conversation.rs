use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent_config::TenantId;
use crate::domain::customer::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// One WhatsApp thread between a tenant and a customer phone number.
///
/// Invariant: at most one `Active` conversation per (tenant, phone) pair,
/// enforced by a partial unique index at the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub tenant_id: TenantId,
    pub customer_phone: String,
    pub customer_id: CustomerId,
    pub status: ConversationStatus,
    pub bot_active: bool,
    pub last_message_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }

    /// Transcript role this direction maps to when replaying history to the
    /// model: inbound text is the customer ("user"), outbound is the agent.
    pub fn transcript_role(&self) -> &'static str {
        match self {
            Self::Inbound => "user",
            Self::Outbound => "assistant",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Image,
    Document,
    Audio,
    Video,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "document" => Some(Self::Document),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Append-only message log entry. Immutable once created except for
/// `delivery_status`, which transport callbacks may advance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub tenant_id: TenantId,
    pub direction: Direction,
    pub body: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    pub provider_message_id: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
}

/// One line of replayed history handed to the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: &'static str,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::{ConversationStatus, DeliveryStatus, Direction, MessageKind};

    #[test]
    fn direction_maps_to_transcript_roles() {
        assert_eq!(Direction::Inbound.transcript_role(), "user");
        assert_eq!(Direction::Outbound.transcript_role(), "assistant");
    }

    #[test]
    fn enum_string_forms_round_trip() {
        for status in [ConversationStatus::Active, ConversationStatus::Closed] {
            assert_eq!(ConversationStatus::parse(status.as_str()), Some(status));
        }
        for kind in [
            MessageKind::Text,
            MessageKind::Image,
            MessageKind::Document,
            MessageKind::Audio,
            MessageKind::Video,
        ] {
            assert_eq!(MessageKind::parse(kind.as_str()), Some(kind));
        }
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Sent,
            DeliveryStatus::Delivered,
            DeliveryStatus::Read,
            DeliveryStatus::Failed,
        ] {
            assert_eq!(DeliveryStatus::parse(status.as_str()), Some(status));
        }
    }
}
