//! In-memory repositories for tests and for wiring components without a
//! database. Same semantics as the SQL implementations, including the
//! single-active-conversation rule.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use tallerbot_core::domain::agent_config::TenantId;
use tallerbot_core::domain::appointment::Appointment;
use tallerbot_core::domain::conversation::{
    Conversation, ConversationId, ConversationStatus, DeliveryStatus, HistoryEntry, Message,
    MessageId,
};
use tallerbot_core::domain::customer::{normalize_phone, Customer, CustomerId};
use tallerbot_core::scheduling::BookedSlot;

use super::{
    AgentConfigRepository, AppointmentRepository, ConversationRepository, CustomerRepository,
    MessageRepository, RepositoryError, TenantAgentProfile,
};

#[derive(Clone, Default)]
pub struct InMemoryCustomerRepository {
    rows: Arc<RwLock<HashMap<(String, String), Customer>>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn find_by_phone(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let key = (tenant_id.0.clone(), normalize_phone(phone));
        Ok(self.rows.read().await.get(&key).cloned())
    }

    async fn get_or_create(
        &self,
        tenant_id: &TenantId,
        name: &str,
        phone: &str,
    ) -> Result<Customer, RepositoryError> {
        let normalized = normalize_phone(phone);
        let key = (tenant_id.0.clone(), normalized.clone());
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get(&key) {
            return Ok(existing.clone());
        }
        let customer = Customer {
            id: CustomerId(format!("CUST-{}", Uuid::new_v4().simple())),
            tenant_id: tenant_id.clone(),
            name: name.to_string(),
            phone: normalized,
            created_at: Utc::now(),
        };
        rows.insert(key, customer.clone());
        Ok(customer)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    rows: Arc<RwLock<Vec<Conversation>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_active(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|conversation| {
                conversation.tenant_id == *tenant_id
                    && conversation.customer_phone == phone
                    && conversation.status == ConversationStatus::Active
            })
            .max_by_key(|conversation| conversation.last_message_at)
            .cloned())
    }

    async fn insert_or_active(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, RepositoryError> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows
            .iter()
            .find(|row| {
                row.tenant_id == conversation.tenant_id
                    && row.customer_phone == conversation.customer_phone
                    && row.status == ConversationStatus::Active
            })
            .cloned()
        {
            return Ok(existing);
        }
        rows.push(conversation.clone());
        Ok(conversation)
    }

    async fn touch_last_message(
        &self,
        id: &ConversationId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|row| row.id == *id) {
            row.last_message_at = at;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMessageRepository {
    rows: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far, in append order.
    pub async fn all(&self) -> Vec<Message> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: &Message) -> Result<MessageId, RepositoryError> {
        self.rows.write().await.push(message.clone());
        Ok(message.id.clone())
    }

    async fn recent_history(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = self.rows.read().await;
        let matching: Vec<HistoryEntry> = rows
            .iter()
            .filter(|message| message.conversation_id == *conversation_id)
            .map(|message| HistoryEntry {
                role: message.direction.transcript_role(),
                text: message.body.clone(),
            })
            .collect();
        let skip = matching.len().saturating_sub(limit as usize);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn update_delivery_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        for message in rows.iter_mut() {
            if message.provider_message_id.as_deref() == Some(provider_message_id) {
                message.delivery_status = status;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAppointmentRepository {
    rows: Arc<RwLock<Vec<Appointment>>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Appointment> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn booked_on(
        &self,
        tenant_id: &TenantId,
        date: NaiveDate,
    ) -> Result<Vec<BookedSlot>, RepositoryError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|appointment| {
                appointment.tenant_id == *tenant_id
                    && appointment.start_at.date() == date
                    && appointment.status.blocks_schedule()
            })
            .map(|appointment| BookedSlot {
                start: appointment.start_at,
                duration_minutes: appointment.duration_minutes,
            })
            .collect())
    }

    async fn create(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.rows.write().await.push(appointment.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAgentConfigRepository {
    rows: Arc<RwLock<HashMap<String, TenantAgentProfile>>>,
}

impl InMemoryAgentConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: TenantAgentProfile) {
        self.rows
            .write()
            .await
            .insert(profile.config.tenant_id.0.clone(), profile);
    }
}

#[async_trait]
impl AgentConfigRepository for InMemoryAgentConfigRepository {
    async fn load(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<TenantAgentProfile>, RepositoryError> {
        Ok(self.rows.read().await.get(&tenant_id.0).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use tallerbot_core::domain::agent_config::TenantId;
    use tallerbot_core::domain::conversation::{
        Conversation, ConversationId, ConversationStatus,
    };
    use tallerbot_core::domain::customer::CustomerId;

    use super::{InMemoryConversationRepository, InMemoryCustomerRepository};
    use crate::repositories::{ConversationRepository, CustomerRepository};

    #[tokio::test]
    async fn in_memory_customer_upsert_matches_sql_semantics() {
        let repo = InMemoryCustomerRepository::new();
        let tenant = TenantId("t1".to_string());

        let first = repo
            .get_or_create(&tenant, "Ana", "whatsapp:+5215551234567")
            .await
            .expect("create");
        let second = repo.get_or_create(&tenant, "Otro", "+5215551234567").await.expect("lookup");
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ana");
    }

    #[tokio::test]
    async fn in_memory_conversation_keeps_one_active() {
        let repo = InMemoryConversationRepository::new();
        let conversation = |id: &str| Conversation {
            id: ConversationId(id.to_string()),
            tenant_id: TenantId("t1".to_string()),
            customer_phone: "+5215551234567".to_string(),
            customer_id: CustomerId("c1".to_string()),
            status: ConversationStatus::Active,
            bot_active: true,
            last_message_at: Utc::now(),
        };

        let first = repo.insert_or_active(conversation("v1")).await.expect("first");
        let second = repo.insert_or_active(conversation("v2")).await.expect("second");
        assert_eq!(first.id, second.id);
    }
}
