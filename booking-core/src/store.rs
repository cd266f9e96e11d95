use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Appointment, AppointmentFilter, AppointmentStatus, NewAppointment};

/// Persistence contract for appointments.
///
/// Implementations must make `insert` atomic with respect to the active-slot
/// invariant: if another `Pending` or `Confirmed` appointment already holds
/// the same `(service_type, appointment_date, appointment_time)`, the insert
/// fails with [`StoreError::SlotTaken`], no matter how many callers race.
#[automock]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Persists a new appointment and returns it with its generated id.
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Lists appointments matching every given filter, ordered by date,
    /// time and creation.
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError>;

    /// Number of active appointments holding exactly this slot.
    async fn count_active(
        &self,
        service_type: &str,
        appointment_date: &str,
        appointment_time: &str,
    ) -> Result<u64, StoreError>;

    /// Sets `status` and `updated_at` only if the record still has status
    /// `expected`. Returns `None` when no record matched.
    ///
    /// Moving an inactive record back to an active status is held to the same
    /// slot invariant as `insert` and fails with [`StoreError::SlotTaken`] when
    /// another active appointment holds the slot.
    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Removes the record. Returns whether anything was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Record counts grouped by status. Statuses with no records may be omitted.
    async fn count_by_status(&self) -> Result<Vec<(AppointmentStatus, u64)>, StoreError>;
}
