use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use tallerbot_core::domain::agent_config::{TenantAgentConfig, TenantId};

use super::{AgentConfigRepository, RepositoryError, TenantAgentProfile};
use crate::DbPool;

pub struct SqlAgentConfigRepository {
    pool: DbPool,
}

impl SqlAgentConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Writes or replaces a tenant's agent profile. Used by operator tooling;
    /// the webhook path only reads.
    pub async fn upsert(
        &self,
        workshop_name: &str,
        config: &TenantAgentConfig,
    ) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_string(config)
            .map_err(|error| RepositoryError::Decode(format!("encode agent config: {error}")))?;

        sqlx::query(
            "INSERT INTO tenant_agent_config (tenant_id, workshop_name, config, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(tenant_id) DO UPDATE SET \
                 workshop_name = excluded.workshop_name, \
                 config = excluded.config, \
                 updated_at = excluded.updated_at",
        )
        .bind(&config.tenant_id.0)
        .bind(workshop_name)
        .bind(&encoded)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AgentConfigRepository for SqlAgentConfigRepository {
    async fn load(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Option<TenantAgentProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT workshop_name, config FROM tenant_agent_config WHERE tenant_id = ?",
        )
        .bind(&tenant_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw = row.get::<String, _>("config");
        let config: TenantAgentConfig = serde_json::from_str(&raw).map_err(|error| {
            RepositoryError::Decode(format!(
                "agent config for tenant `{}`: {error}",
                tenant_id.0
            ))
        })?;

        Ok(Some(TenantAgentProfile {
            workshop_name: row.get::<String, _>("workshop_name"),
            config,
        }))
    }
}
