use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use tallerbot_core::domain::agent_config::{TenantAgentConfig, TenantId};
use tallerbot_core::domain::appointment::Appointment;
use tallerbot_core::domain::conversation::{
    Conversation, ConversationId, DeliveryStatus, HistoryEntry, Message, MessageId,
};
use tallerbot_core::domain::customer::Customer;
use tallerbot_core::scheduling::BookedSlot;

pub mod agent_config;
pub mod appointment;
pub mod conversation;
pub mod customer;
pub mod memory;
pub mod message;

pub use agent_config::SqlAgentConfigRepository;
pub use appointment::SqlAppointmentRepository;
pub use conversation::SqlConversationRepository;
pub use customer::SqlCustomerRepository;
pub use memory::{
    InMemoryAgentConfigRepository, InMemoryAppointmentRepository, InMemoryConversationRepository,
    InMemoryCustomerRepository, InMemoryMessageRepository,
};
pub use message::SqlMessageRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_phone(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Idempotent lookup-or-insert keyed by normalized phone. Concurrent
    /// callers for the same phone must converge on one row.
    async fn get_or_create(
        &self,
        tenant_id: &TenantId,
        name: &str,
        phone: &str,
    ) -> Result<Customer, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_active(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Inserts the conversation unless an active one already exists for the
    /// same (tenant, phone); returns whichever row is active afterwards.
    async fn insert_or_active(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, RepositoryError>;

    async fn touch_last_message(
        &self,
        id: &ConversationId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append(&self, message: &Message) -> Result<MessageId, RepositoryError>;

    /// Last `limit` messages, returned oldest first, mapped to transcript
    /// roles (inbound -> user, outbound -> assistant).
    async fn recent_history(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, RepositoryError>;

    async fn update_delivery_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Occupied windows on one calendar day, excluding cancelled rows.
    async fn booked_on(
        &self,
        tenant_id: &TenantId,
        date: NaiveDate,
    ) -> Result<Vec<BookedSlot>, RepositoryError>;

    async fn create(&self, appointment: &Appointment) -> Result<(), RepositoryError>;
}

/// Tenant agent configuration plus the display facts stored beside it.
#[derive(Clone, Debug, PartialEq)]
pub struct TenantAgentProfile {
    pub workshop_name: String,
    pub config: TenantAgentConfig,
}

#[async_trait]
pub trait AgentConfigRepository: Send + Sync {
    async fn load(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<TenantAgentProfile>, RepositoryError>;
}
