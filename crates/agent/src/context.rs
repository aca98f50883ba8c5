//! Conversation resolution: inbound message to (customer, conversation,
//! history) against the store.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tallerbot_core::domain::agent_config::TenantId;
use tallerbot_core::domain::conversation::{
    Conversation, ConversationId, ConversationStatus, Direction, HistoryEntry, Message, MessageId,
};
use tallerbot_core::domain::customer::Customer;
use tallerbot_core::errors::TurnError;
use tallerbot_db::repositories::{
    ConversationRepository, CustomerRepository, MessageRepository, RepositoryError,
};
use tallerbot_whatsapp::inbound::NormalizedInbound;

fn store_error(error: RepositoryError) -> TurnError {
    TurnError::Store(error.to_string())
}

/// Customer and thread state for one turn, resolved before the model runs.
pub struct ResolvedTurn {
    pub customer: Customer,
    pub conversation: Conversation,
    pub inbound_message_id: MessageId,
    pub history: Vec<HistoryEntry>,
}

pub struct ConversationGateway {
    customers: Arc<dyn CustomerRepository>,
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl ConversationGateway {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self { customers, conversations, messages }
    }

    /// Get-or-create the customer, reuse or open the active conversation,
    /// append the inbound message, and load the replay window. The history
    /// returned already includes the inbound message as its last entry.
    pub async fn resolve(
        &self,
        tenant_id: &TenantId,
        inbound: &NormalizedInbound,
        history_limit: u32,
    ) -> Result<ResolvedTurn, TurnError> {
        let fallback_name = inbound.sender_phone.clone();
        let name = inbound.sender_name.as_deref().unwrap_or(&fallback_name);
        let customer = self
            .customers
            .get_or_create(tenant_id, name, &inbound.sender_phone)
            .await
            .map_err(store_error)?;

        let now = Utc::now();
        let conversation = self
            .conversations
            .insert_or_active(Conversation {
                id: ConversationId(format!("CONV-{}", Uuid::new_v4().simple())),
                tenant_id: tenant_id.clone(),
                customer_phone: customer.phone.clone(),
                customer_id: customer.id.clone(),
                status: ConversationStatus::Active,
                bot_active: true,
                last_message_at: now,
            })
            .await
            .map_err(store_error)?;

        let inbound_message = Message {
            id: MessageId(format!("MSG-{}", Uuid::new_v4().simple())),
            conversation_id: conversation.id.clone(),
            tenant_id: tenant_id.clone(),
            direction: Direction::Inbound,
            body: inbound.body.clone(),
            kind: inbound.kind,
            media_url: inbound.media_url.clone(),
            provider_message_id: inbound.provider_message_id.clone(),
            delivery_status: tallerbot_core::domain::conversation::DeliveryStatus::Delivered,
            created_at: now,
        };
        let inbound_message_id =
            self.messages.append(&inbound_message).await.map_err(store_error)?;
        self.conversations
            .touch_last_message(&conversation.id, now)
            .await
            .map_err(store_error)?;

        let history = self
            .messages
            .recent_history(&conversation.id, history_limit)
            .await
            .map_err(store_error)?;

        Ok(ResolvedTurn { customer, conversation, inbound_message_id, history })
    }
}
