use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use tallerbot_core::domain::agent_config::TenantId;
use tallerbot_core::domain::conversation::{
    Conversation, ConversationId, ConversationStatus,
};
use tallerbot_core::domain::customer::CustomerId;

use super::customer::parse_timestamp;
use super::{ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn find_active(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, customer_phone, customer_id, status, bot_active, \
                    last_message_at \
             FROM conversation \
             WHERE tenant_id = ? AND customer_phone = ? AND status = 'active' \
             ORDER BY last_message_at DESC LIMIT 1",
        )
        .bind(&tenant_id.0)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(conversation_from_row).transpose()
    }

    async fn insert_or_active(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, RepositoryError> {
        // The partial unique index makes the insert a no-op when another
        // request already created the active conversation; the re-select
        // returns the winner either way.
        sqlx::query(
            "INSERT INTO conversation \
                 (id, tenant_id, customer_phone, customer_id, status, bot_active, \
                  last_message_at) \
             VALUES (?, ?, ?, ?, 'active', ?, ?) \
             ON CONFLICT DO NOTHING",
        )
        .bind(&conversation.id.0)
        .bind(&conversation.tenant_id.0)
        .bind(&conversation.customer_phone)
        .bind(&conversation.customer_id.0)
        .bind(i64::from(conversation.bot_active))
        .bind(conversation.last_message_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find_active(&conversation.tenant_id, &conversation.customer_phone)
            .await?
            .ok_or_else(|| {
                RepositoryError::Decode(format!(
                    "active conversation for `{}` missing after upsert",
                    conversation.customer_phone
                ))
            })
    }

    async fn touch_last_message(
        &self,
        id: &ConversationId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE conversation SET last_message_at = ? WHERE id = ?")
            .bind(at.to_rfc3339())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn conversation_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Conversation, RepositoryError> {
    let status_raw = row.get::<String, _>("status");
    let status = ConversationStatus::parse(&status_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown conversation status `{status_raw}`"))
    })?;

    Ok(Conversation {
        id: ConversationId(row.get::<String, _>("id")),
        tenant_id: TenantId(row.get::<String, _>("tenant_id")),
        customer_phone: row.get::<String, _>("customer_phone"),
        customer_id: CustomerId(row.get::<String, _>("customer_id")),
        status,
        bot_active: row.get::<i64, _>("bot_active") != 0,
        last_message_at: parse_timestamp(&row.get::<String, _>("last_message_at"))?,
    })
}
