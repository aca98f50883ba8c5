use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sqlx::Row;

use tallerbot_core::domain::agent_config::TenantId;
use tallerbot_core::domain::appointment::Appointment;
use tallerbot_core::scheduling::BookedSlot;

use super::{AppointmentRepository, RepositoryError};
use crate::DbPool;

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct SqlAppointmentRepository {
    pool: DbPool,
}

impl SqlAppointmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for SqlAppointmentRepository {
    async fn booked_on(
        &self,
        tenant_id: &TenantId,
        date: NaiveDate,
    ) -> Result<Vec<BookedSlot>, RepositoryError> {
        // Local wall-clock text sorts lexicographically, so day bounds are
        // plain string comparisons.
        let day_start = format!("{date}T00:00:00");
        let day_end = format!("{}T00:00:00", date + Duration::days(1));

        let rows = sqlx::query(
            "SELECT start_at, duration_minutes FROM appointment \
             WHERE tenant_id = ? AND start_at >= ? AND start_at < ? \
               AND status != 'cancelled' \
             ORDER BY start_at",
        )
        .bind(&tenant_id.0)
        .bind(&day_start)
        .bind(&day_end)
        .fetch_all(&self.pool)
        .await?;

        let mut slots = Vec::with_capacity(rows.len());
        for row in rows {
            slots.push(BookedSlot {
                start: parse_local(&row.get::<String, _>("start_at"))?,
                duration_minutes: row.get::<i64, _>("duration_minutes") as u32,
            });
        }
        Ok(slots)
    }

    async fn create(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO appointment \
                 (id, tenant_id, customer_id, vehicle_id, service_type, start_at, \
                  duration_minutes, status, notes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&appointment.id.0)
        .bind(&appointment.tenant_id.0)
        .bind(&appointment.customer_id.0)
        .bind(appointment.vehicle_id.as_deref())
        .bind(&appointment.service_type)
        .bind(appointment.start_at.format(LOCAL_FORMAT).to_string())
        .bind(i64::from(appointment.duration_minutes))
        .bind(appointment.status.as_str())
        .bind(appointment.notes.as_deref())
        .bind(appointment.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_local(raw: &str) -> Result<NaiveDateTime, RepositoryError> {
    NaiveDateTime::parse_from_str(raw, LOCAL_FORMAT)
        .map_err(|error| RepositoryError::Decode(format!("bad local timestamp `{raw}`: {error}")))
}
