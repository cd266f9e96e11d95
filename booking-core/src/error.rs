use thiserror::Error;
use uuid::Uuid;

use crate::models::AppointmentStatus;

/// Errors surfaced by availability and lifecycle operations.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("time slot {service_type} {appointment_date} {appointment_time} is not available")]
    SlotUnavailable {
        service_type: String,
        appointment_date: String,
        appointment_time: String,
    },

    #[error("appointment {0} not found")]
    NotFound(Uuid),

    #[error("cannot change appointment status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("operation requires the staff role")]
    Forbidden,

    #[error("storage error: {0}")]
    Storage(#[source] StoreError),

    #[error("notification error: {0}")]
    Notification(#[from] NotificationError),
}

impl From<StoreError> for BookingError {
    fn from(error: StoreError) -> Self {
        BookingError::Storage(error)
    }
}

/// Errors reported by an `AppointmentStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an active appointment already holds this slot")]
    SlotTaken,

    #[error("appointment number {0} is already in use")]
    DuplicateNumber(String),

    #[error("stored record is malformed: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("business hours must satisfy start < end <= 24, got {start}..{end}")]
    BusinessHours { start: u32, end: u32 },

    #[error("slot duration must be positive")]
    ZeroSlotDuration,
}
