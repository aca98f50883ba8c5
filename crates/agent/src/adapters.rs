//! Domain side-effect adapters behind the tools.
//!
//! Adapters are the only code that turns model intent into writes. Every
//! check the prompt promises (catalog membership, business hours, slot
//! conflicts) is re-verified here; the model's claims are never trusted.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use tallerbot_core::domain::agent_config::{ServiceOffering, TenantAgentConfig};
use tallerbot_core::domain::appointment::{Appointment, AppointmentId, AppointmentStatus};
use tallerbot_core::domain::customer::Customer;
use tallerbot_core::errors::AdapterError;
use tallerbot_core::quoting::{build_quote, match_service, QuoteSummary};
use tallerbot_core::scheduling::{conflicts_with_any, free_slots};
use tallerbot_db::repositories::{AppointmentRepository, RepositoryError};

fn store_error(error: RepositoryError) -> AdapterError {
    AdapterError::Store(error.to_string())
}

/// Free-slot listing for one calendar day.
pub struct AvailabilityDesk {
    appointments: Arc<dyn AppointmentRepository>,
}

/// What a day looks like to the booking tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DayAvailability {
    Closed,
    Open { slots: Vec<NaiveTime> },
}

impl AvailabilityDesk {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn availability_on(
        &self,
        config: &TenantAgentConfig,
        date: NaiveDate,
    ) -> Result<DayAvailability, AdapterError> {
        let Some(window) = config.business_hours.window_for(date.weekday()) else {
            return Ok(DayAvailability::Closed);
        };
        let booked =
            self.appointments.booked_on(&config.tenant_id, date).await.map_err(store_error)?;
        Ok(DayAvailability::Open {
            slots: free_slots(date, &window, config.slot_minutes, &booked),
        })
    }
}

/// Books appointments after re-validating everything the model asserted.
pub struct AppointmentScheduler {
    appointments: Arc<dyn AppointmentRepository>,
}

impl AppointmentScheduler {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn schedule(
        &self,
        config: &TenantAgentConfig,
        customer: &Customer,
        service_query: &str,
        start_at: NaiveDateTime,
        vehicle: Option<String>,
        notes: Option<String>,
    ) -> Result<Appointment, AdapterError> {
        let service = matched_service(config, service_query)?;
        let duration = service.duration_minutes;

        let window = config.business_hours.window_for(start_at.date().weekday()).ok_or_else(
            || {
                AdapterError::InvalidArgument {
                    field: "date".to_string(),
                    reason: "the workshop is closed that day".to_string(),
                }
            },
        )?;
        let end_time = (start_at + chrono::Duration::minutes(i64::from(duration))).time();
        if !window.contains(start_at.time()) || end_time > window.close {
            return Err(AdapterError::InvalidArgument {
                field: "time".to_string(),
                reason: format!(
                    "outside business hours ({} - {})",
                    window.open.format("%H:%M"),
                    window.close.format("%H:%M")
                ),
            });
        }

        // The slot may have been taken since the model checked availability.
        let booked = self
            .appointments
            .booked_on(&config.tenant_id, start_at.date())
            .await
            .map_err(store_error)?;
        if conflicts_with_any(start_at, duration, &booked) {
            return Err(AdapterError::SchedulingConflict(format!(
                "{} is already taken",
                start_at.format("%Y-%m-%d %H:%M")
            )));
        }

        let appointment = Appointment {
            id: AppointmentId(format!("APT-{}", Uuid::new_v4().simple())),
            tenant_id: config.tenant_id.clone(),
            customer_id: customer.id.clone(),
            vehicle_id: vehicle,
            service_type: service.name.clone(),
            start_at,
            duration_minutes: duration,
            status: AppointmentStatus::Scheduled,
            notes,
            created_at: chrono::Utc::now(),
        };
        self.appointments.create(&appointment).await.map_err(store_error)?;
        Ok(appointment)
    }
}

/// Builds formal quotes from the tenant catalog.
pub struct QuoteDesk;

impl QuoteDesk {
    pub fn quote(
        config: &TenantAgentConfig,
        requested: &[String],
    ) -> Result<QuoteSummary, AdapterError> {
        build_quote(&config.services, requested, config.tax_rate)
            .map_err(AdapterError::UnknownService)
    }
}

pub(crate) fn matched_service<'a>(
    config: &'a TenantAgentConfig,
    query: &str,
) -> Result<&'a ServiceOffering, AdapterError> {
    match_service(&config.services, query).ok_or_else(|| {
        let known: Vec<&str> =
            config.services.iter().map(|service| service.name.as_str()).collect();
        AdapterError::UnknownService(format!(
            "`{query}` is not in the catalog; known services: {}",
            known.join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime, Utc};
    use rust_decimal::Decimal;

    use tallerbot_core::domain::agent_config::{
        LlmVendor, ServiceOffering, TenantAgentConfig, TenantId, WhatsAppProvider,
    };
    use tallerbot_core::domain::appointment::{Appointment, AppointmentId, AppointmentStatus};
    use tallerbot_core::domain::customer::{Customer, CustomerId};
    use tallerbot_core::errors::AdapterError;
    use tallerbot_core::hours::{DayWindow, WeekSchedule};
    use tallerbot_db::repositories::{AppointmentRepository, InMemoryAppointmentRepository};

    use super::{AppointmentScheduler, AvailabilityDesk, DayAvailability, QuoteDesk};

    fn config() -> TenantAgentConfig {
        let window = DayWindow {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        };
        TenantAgentConfig {
            tenant_id: TenantId("t1".to_string()),
            enabled: true,
            vendor: LlmVendor::OpenAi,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_tokens: 1024,
            business_hours_only: false,
            auto_schedule_appointments: true,
            auto_create_orders: true,
            require_human_approval: false,
            business_hours: WeekSchedule {
                monday: Some(window),
                tuesday: Some(window),
                wednesday: Some(window),
                thursday: Some(window),
                friday: Some(window),
                saturday: None,
                sunday: None,
            },
            services: vec![ServiceOffering {
                name: "Cambio de aceite".to_string(),
                price: Decimal::new(500, 0),
                duration_minutes: 60,
                description: String::new(),
            }],
            policies: String::new(),
            faqs: Vec::new(),
            whatsapp_provider: WhatsAppProvider::Twilio,
            slot_minutes: 60,
            tax_rate: Decimal::new(16, 2),
            history_limit: 10,
        }
    }

    fn customer() -> Customer {
        Customer {
            id: CustomerId("c1".to_string()),
            tenant_id: TenantId("t1".to_string()),
            name: "Ana".to_string(),
            phone: "+5215551234567".to_string(),
            created_at: Utc::now(),
        }
    }

    // 2026-08-28 is a Friday.
    fn friday_at(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 28).unwrap().and_hms_opt(hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn scheduling_rechecks_conflicts_at_write_time() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        repo.create(&Appointment {
            id: AppointmentId("a0".to_string()),
            tenant_id: TenantId("t1".to_string()),
            customer_id: CustomerId("c9".to_string()),
            vehicle_id: None,
            service_type: "Cambio de aceite".to_string(),
            start_at: friday_at(14),
            duration_minutes: 60,
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
        })
        .await
        .expect("seed");

        let scheduler = AppointmentScheduler::new(repo.clone());
        let conflict = scheduler
            .schedule(&config(), &customer(), "cambio de aceite", friday_at(14), None, None)
            .await
            .expect_err("must conflict");
        assert!(matches!(conflict, AdapterError::SchedulingConflict(_)));
        assert_eq!(repo.all().await.len(), 1);
    }

    #[tokio::test]
    async fn scheduling_succeeds_inside_the_window() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        let scheduler = AppointmentScheduler::new(repo.clone());

        let appointment = scheduler
            .schedule(&config(), &customer(), "aceite", friday_at(14), None, None)
            .await
            .expect("schedule");
        assert_eq!(appointment.service_type, "Cambio de aceite");
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(repo.all().await.len(), 1);
    }

    #[tokio::test]
    async fn scheduling_rejects_closed_days_and_out_of_window_times() {
        let scheduler = AppointmentScheduler::new(Arc::new(InMemoryAppointmentRepository::new()));
        // 2026-08-30 is a Sunday.
        let sunday =
            NaiveDate::from_ymd_opt(2026, 8, 30).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let closed = scheduler
            .schedule(&config(), &customer(), "aceite", sunday, None, None)
            .await
            .expect_err("closed day");
        assert!(matches!(closed, AdapterError::InvalidArgument { .. }));

        // 17:30 start would run past the 18:00 close.
        let late = NaiveDate::from_ymd_opt(2026, 8, 28)
            .unwrap()
            .and_hms_opt(17, 30, 0)
            .unwrap();
        let out = scheduler
            .schedule(&config(), &customer(), "aceite", late, None, None)
            .await
            .expect_err("past close");
        assert!(matches!(out, AdapterError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn unknown_service_is_reported_with_the_catalog() {
        let scheduler = AppointmentScheduler::new(Arc::new(InMemoryAppointmentRepository::new()));
        let error = scheduler
            .schedule(&config(), &customer(), "hojalatería", friday_at(10), None, None)
            .await
            .expect_err("unknown");
        let AdapterError::UnknownService(message) = error else {
            panic!("expected unknown service");
        };
        assert!(message.contains("Cambio de aceite"));
    }

    #[tokio::test]
    async fn availability_reports_closed_days() {
        let desk = AvailabilityDesk::new(Arc::new(InMemoryAppointmentRepository::new()));
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let availability = desk.availability_on(&config(), sunday).await.expect("availability");
        assert_eq!(availability, DayAvailability::Closed);
    }

    #[tokio::test]
    async fn availability_excludes_booked_slots() {
        let repo = Arc::new(InMemoryAppointmentRepository::new());
        let scheduler = AppointmentScheduler::new(repo.clone());
        scheduler
            .schedule(&config(), &customer(), "aceite", friday_at(10), None, None)
            .await
            .expect("seed");

        let desk = AvailabilityDesk::new(repo);
        let friday = NaiveDate::from_ymd_opt(2026, 8, 28).unwrap();
        let DayAvailability::Open { slots } =
            desk.availability_on(&config(), friday).await.expect("availability")
        else {
            panic!("friday is open");
        };
        assert!(!slots.contains(&NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
        assert!(slots.contains(&NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    }

    #[test]
    fn quote_desk_applies_the_tenant_tax_rate() {
        let summary =
            QuoteDesk::quote(&config(), &["Cambio de aceite".to_string()]).expect("quote");
        assert_eq!(summary.total, Decimal::new(58000, 2));
    }
}
