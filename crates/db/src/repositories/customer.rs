use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use tallerbot_core::domain::agent_config::TenantId;
use tallerbot_core::domain::customer::{normalize_phone, Customer, CustomerId};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find_by_phone(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let normalized = normalize_phone(phone);
        let row = sqlx::query(
            "SELECT id, tenant_id, name, phone, created_at FROM customer \
             WHERE tenant_id = ? AND phone = ?",
        )
        .bind(&tenant_id.0)
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;

        row.map(customer_from_row).transpose()
    }

    async fn get_or_create(
        &self,
        tenant_id: &TenantId,
        name: &str,
        phone: &str,
    ) -> Result<Customer, RepositoryError> {
        let normalized = normalize_phone(phone);

        // Insert-then-select under the unique (tenant_id, phone) index: a
        // concurrent creator makes the insert a no-op and the select finds
        // its row.
        sqlx::query(
            "INSERT INTO customer (id, tenant_id, name, phone, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(tenant_id, phone) DO NOTHING",
        )
        .bind(format!("CUST-{}", Uuid::new_v4().simple()))
        .bind(&tenant_id.0)
        .bind(name)
        .bind(&normalized)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find_by_phone(tenant_id, &normalized).await?.ok_or_else(|| {
            RepositoryError::Decode(format!(
                "customer for phone `{normalized}` missing after upsert"
            ))
        })
    }
}

fn customer_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    Ok(Customer {
        id: CustomerId(row.get::<String, _>("id")),
        tenant_id: TenantId(row.get::<String, _>("tenant_id")),
        name: row.get::<String, _>("name"),
        phone: row.get::<String, _>("phone"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("bad timestamp `{raw}`: {error}")))
}

#[cfg(test)]
mod tests {
    use tallerbot_core::domain::agent_config::TenantId;

    use crate::migrations::run_pending;
    use crate::repositories::{CustomerRepository, SqlCustomerRepository};
    use crate::connect_with_settings;

    async fn repo() -> (SqlCustomerRepository, crate::DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        (SqlCustomerRepository::new(pool.clone()), pool)
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let (repo, pool) = repo().await;
        let tenant = TenantId("t1".to_string());

        let first = repo
            .get_or_create(&tenant, "Ana", "whatsapp:+52 155 5123 4567")
            .await
            .expect("create");
        let second =
            repo.get_or_create(&tenant, "Ana García", "+5215551234567").await.expect("lookup");

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Ana", "existing row keeps its original name");
        assert_eq!(second.phone, "+5215551234567");
        pool.close().await;
    }

    #[tokio::test]
    async fn lookup_normalizes_the_phone() {
        let (repo, pool) = repo().await;
        let tenant = TenantId("t1".to_string());

        repo.get_or_create(&tenant, "Ana", "+5215551234567").await.expect("create");
        let found = repo
            .find_by_phone(&tenant, "whatsapp:+52 1 555 123 4567")
            .await
            .expect("query")
            .expect("customer");
        assert_eq!(found.name, "Ana");
        pool.close().await;
    }

    #[tokio::test]
    async fn customers_are_tenant_scoped() {
        let (repo, pool) = repo().await;

        repo.get_or_create(&TenantId("t1".to_string()), "Ana", "+5215551234567")
            .await
            .expect("create");
        let other = repo
            .find_by_phone(&TenantId("t2".to_string()), "+5215551234567")
            .await
            .expect("query");
        assert!(other.is_none());
        pool.close().await;
    }
}
