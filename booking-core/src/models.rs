use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::BookingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub appointment_number: String,
    pub service_type: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub purpose: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Statuses that occupy a slot.
    pub const ACTIVE: [AppointmentStatus; 2] = [AppointmentStatus::Pending, AppointmentStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `Pending -> Confirmed -> Completed`, and either active status may be
    /// cancelled. Terminal statuses never move again.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = BookingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(AppointmentStatus::Pending),
            "Confirmed" => Ok(AppointmentStatus::Confirmed),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(BookingError::Validation(format!(
                "unrecognized status '{}', expected one of Pending, Confirmed, Completed, Cancelled",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Input to `LifecycleManager::create_appointment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    pub service_type: String,
    pub client: ClientInfo,
    pub appointment_date: String,
    pub appointment_time: String,
    pub purpose: Option<String>,
}

impl BookingRequest {
    /// Checks every required field is present and non-blank.
    pub fn validate(&self) -> Result<(), BookingError> {
        let required = [
            ("service_type", &self.service_type),
            ("client_name", &self.client.name),
            ("client_email", &self.client.email),
            ("client_phone", &self.client.phone),
            ("appointment_date", &self.appointment_date),
            ("appointment_time", &self.appointment_time),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BookingError::Validation(format!("missing required fields: {}", missing.join(", "))))
        }
    }
}

/// Everything needed to persist a new appointment except the id, which the
/// store assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub appointment_number: String,
    pub service_type: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub purpose: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewAppointment {
    pub fn pending(request: &BookingRequest, appointment_number: String, now: DateTime<Utc>) -> Self {
        Self {
            appointment_number,
            service_type: request.service_type.clone(),
            client_name: request.client.name.clone(),
            client_email: request.client.email.clone(),
            client_phone: request.client.phone.clone(),
            appointment_date: request.appointment_date.clone(),
            appointment_time: request.appointment_time.clone(),
            purpose: request.purpose.clone().unwrap_or_default(),
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_appointment(self, id: Uuid) -> Appointment {
        Appointment {
            id,
            appointment_number: self.appointment_number,
            service_type: self.service_type,
            client_name: self.client_name,
            client_email: self.client_email,
            client_phone: self.client_phone,
            appointment_date: self.appointment_date,
            appointment_time: self.appointment_time,
            purpose: self.purpose,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Equality filters for listing. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub service_type: Option<String>,
    pub statuses: Option<Vec<AppointmentStatus>>,
    pub appointment_date: Option<String>,
}

impl AppointmentFilter {
    pub fn active_on(service_type: &str, appointment_date: &str) -> Self {
        Self {
            service_type: Some(service_type.to_string()),
            statuses: Some(AppointmentStatus::ACTIVE.to_vec()),
            appointment_date: Some(appointment_date.to_string()),
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.service_type.as_ref().map_or(true, |s| *s == appointment.service_type)
            && self.statuses.as_ref().map_or(true, |s| s.contains(&appointment.status))
            && self.appointment_date.as_ref().map_or(true, |d| *d == appointment.appointment_date)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl Statistics {
    pub fn from_counts(counts: &[(AppointmentStatus, u64)]) -> Self {
        let mut stats = Statistics::default();
        for (status, count) in counts {
            stats.total += count;
            match status {
                AppointmentStatus::Pending => stats.pending += count,
                AppointmentStatus::Confirmed => stats.confirmed += count,
                AppointmentStatus::Completed => stats.completed += count,
                AppointmentStatus::Cancelled => stats.cancelled += count,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Staff,
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "staff" => Ok(Role::Staff),
            other => Err(BookingError::Validation(format!("unrecognized role '{}'", other))),
        }
    }
}

/// The authenticated actor, as handed over by the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    pub role: Role,
}

impl Principal {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }
}

/// Builds `APP-<YYYYMMDD>-<TOKEN>` where the token is the first four
/// characters of a random v4 UUID, uppercased.
pub fn appointment_number_for(date: NaiveDate) -> String {
    let token: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .collect::<String>()
        .to_uppercase();
    format!("APP-{}-{}", date.format("%Y%m%d"), token)
}
