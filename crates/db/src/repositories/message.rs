use async_trait::async_trait;
use sqlx::Row;

use tallerbot_core::domain::conversation::{
    ConversationId, DeliveryStatus, Direction, HistoryEntry, Message, MessageId,
};

use super::{MessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMessageRepository {
    pool: DbPool,
}

impl SqlMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for SqlMessageRepository {
    async fn append(&self, message: &Message) -> Result<MessageId, RepositoryError> {
        sqlx::query(
            "INSERT INTO message \
                 (id, conversation_id, tenant_id, direction, body, kind, media_url, \
                  provider_message_id, delivery_status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id.0)
        .bind(&message.conversation_id.0)
        .bind(&message.tenant_id.0)
        .bind(message.direction.as_str())
        .bind(&message.body)
        .bind(message.kind.as_str())
        .bind(message.media_url.as_deref())
        .bind(message.provider_message_id.as_deref())
        .bind(message.delivery_status.as_str())
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(message.id.clone())
    }

    async fn recent_history(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT direction, body FROM message \
             WHERE conversation_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(&conversation_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            let direction_raw = row.get::<String, _>("direction");
            let direction = Direction::parse(&direction_raw).ok_or_else(|| {
                RepositoryError::Decode(format!("unknown message direction `{direction_raw}`"))
            })?;
            history.push(HistoryEntry {
                role: direction.transcript_role(),
                text: row.get::<String, _>("body"),
            });
        }

        // Query returns newest first; the model wants chronological order.
        history.reverse();
        Ok(history)
    }

    async fn update_delivery_status(
        &self,
        provider_message_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE message SET delivery_status = ? WHERE provider_message_id = ?")
            .bind(status.as_str())
            .bind(provider_message_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
