use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent_config::TenantId;
use crate::domain::customer::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "scheduled" => Some(Self::Scheduled),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Whether an appointment in this state blocks its time window.
    pub fn blocks_schedule(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A booked service window. Created by the bot through the scheduler adapter;
/// its later lifecycle (confirm, complete, cancel) belongs to the wider ERP.
///
/// `start_at` is tenant-local wall-clock time, matching the business-hours
/// table it was validated against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub vehicle_id: Option<String>,
    pub service_type: String,
    pub start_at: NaiveDateTime,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::AppointmentStatus;

    #[test]
    fn only_cancelled_frees_the_window() {
        assert!(AppointmentStatus::Scheduled.blocks_schedule());
        assert!(AppointmentStatus::Confirmed.blocks_schedule());
        assert!(AppointmentStatus::InProgress.blocks_schedule());
        assert!(AppointmentStatus::Completed.blocks_schedule());
        assert!(AppointmentStatus::NoShow.blocks_schedule());
        assert!(!AppointmentStatus::Cancelled.blocks_schedule());
    }

    #[test]
    fn status_string_forms_round_trip() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
    }
}
