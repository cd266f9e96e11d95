use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityEngine;
use crate::error::{BookingError, StoreError};
use crate::models::*;
use crate::notify::{NotificationIntent, Notifier};
use crate::store::AppointmentStore;

const MAX_NUMBER_ATTEMPTS: usize = 3;

/// Owns every write to appointments: booking, status changes, cancellation
/// and removal, plus the notifications that follow them.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn AppointmentStore>,
    availability: AvailabilityEngine,
    notifier: Arc<dyn Notifier>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        availability: AvailabilityEngine,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { store, availability, notifier }
    }

    pub fn availability(&self) -> &AvailabilityEngine {
        &self.availability
    }

    pub fn generate_appointment_number() -> String {
        appointment_number_for(Utc::now().date_naive())
    }

    pub async fn create_appointment(&self, request: BookingRequest) -> Result<Appointment, BookingError> {
        request.validate()?;

        let unavailable = || BookingError::SlotUnavailable {
            service_type: request.service_type.clone(),
            appointment_date: request.appointment_date.clone(),
            appointment_time: request.appointment_time.clone(),
        };

        if !self
            .availability
            .is_available(&request.service_type, &request.appointment_date, &request.appointment_time)
            .await?
        {
            return Err(unavailable());
        }

        let mut attempt = 0;
        let appointment = loop {
            attempt += 1;
            let now = Utc::now();
            let draft = NewAppointment::pending(&request, appointment_number_for(now.date_naive()), now);

            match self.store.insert(draft).await {
                Ok(appointment) => break appointment,
                Err(StoreError::SlotTaken) => return Err(unavailable()),
                Err(StoreError::DuplicateNumber(number)) if attempt < MAX_NUMBER_ATTEMPTS => {
                    warn!("Appointment number {} already taken, generating another", number);
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!(
            "Created appointment {} ({}) for {} {} {}",
            appointment.appointment_number,
            appointment.id,
            appointment.service_type,
            appointment.appointment_date,
            appointment.appointment_time
        );

        self.emit(NotificationIntent::confirmation(appointment.clone())).await;

        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        self.store.get(id).await?.ok_or(BookingError::NotFound(id))
    }

    pub async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, BookingError> {
        Ok(self.store.list(filter).await?)
    }

    pub async fn update_status(&self, id: Uuid, new_status: &str) -> Result<Appointment, BookingError> {
        let new_status: AppointmentStatus = new_status.parse()?;
        self.transition(id, new_status).await
    }

    /// Moves the appointment to `Cancelled`. The record is kept and the slot
    /// becomes bookable again.
    pub async fn cancel_appointment(&self, id: Uuid) -> Result<Appointment, BookingError> {
        self.transition(id, AppointmentStatus::Cancelled).await
    }

    /// Physically removes the record. Administrative use only; ordinary
    /// cancellation goes through `cancel_appointment`.
    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), BookingError> {
        if !self.store.delete(id).await? {
            return Err(BookingError::NotFound(id));
        }
        info!("Deleted appointment {}", id);
        Ok(())
    }

    /// Emits a reminder for an existing appointment. Unlike the
    /// notifications that trail a mutation, a failed reminder is reported.
    pub async fn send_reminder(&self, id: Uuid) -> Result<(), BookingError> {
        let appointment = self.get_appointment(id).await?;
        let report = self.notifier.notify(&NotificationIntent::reminder(appointment)).await?;
        info!("Reminder for appointment {} dispatched: {:?}", id, report.outcomes);
        Ok(())
    }

    pub async fn compute_statistics(&self, role: Role) -> Result<Statistics, BookingError> {
        if role != Role::Staff {
            return Err(BookingError::Forbidden);
        }
        let counts = self.store.count_by_status().await?;
        Ok(Statistics::from_counts(&counts))
    }

    async fn transition(&self, id: Uuid, new_status: AppointmentStatus) -> Result<Appointment, BookingError> {
        let current = self.get_appointment(id).await?;

        if !current.status.can_transition_to(new_status) {
            return Err(BookingError::InvalidTransition { from: current.status, to: new_status });
        }

        let updated = match self
            .store
            .update_status(id, current.status, new_status, Utc::now())
            .await?
        {
            Some(updated) => updated,
            // Someone else changed or removed it between the read and the write.
            None => {
                let latest = self.get_appointment(id).await?;
                return Err(BookingError::InvalidTransition { from: latest.status, to: new_status });
            }
        };

        info!(
            "Appointment {} moved from {} to {}",
            updated.appointment_number, current.status, new_status
        );

        let refreshed = match self.store.get(id).await {
            Ok(Some(refreshed)) => refreshed,
            Ok(None) => updated.clone(),
            Err(e) => {
                warn!("Could not re-read appointment {} after update: {}", id, e);
                updated.clone()
            }
        };
        self.emit(NotificationIntent::status_update(refreshed, new_status)).await;

        Ok(updated)
    }

    /// Best-effort delivery. The outcome is logged and never changes the
    /// result of the operation that triggered it.
    async fn emit(&self, intent: NotificationIntent) {
        let id = intent.appointment.id;
        match self.notifier.notify(&intent).await {
            Ok(report) if report.all_delivered() => {
                info!("Sent {:?} notification for appointment {}", intent.kind, id);
            }
            Ok(report) => {
                warn!(
                    "{:?} notification for appointment {} partially failed: {:?}",
                    intent.kind, id, report.outcomes
                );
            }
            Err(e) => {
                error!("Failed to send {:?} notification for appointment {}: {}", intent.kind, id, e);
            }
        }
    }
}
