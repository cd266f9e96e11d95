use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Appointment, AppointmentFilter, AppointmentStatus, NewAppointment};
use crate::store::AppointmentStore;

/// Process-local store. The slot check and the insert happen under a single
/// lock, which makes concurrent bookings for one slot serialize.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    appointments: Mutex<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn holds_slot(existing: &Appointment, service_type: &str, date: &str, time: &str) -> bool {
    existing.status.is_active()
        && existing.service_type == service_type
        && existing.appointment_date == date
        && existing.appointment_time == time
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.lock().await;

        if appointment.status.is_active()
            && appointments.values().any(|existing| {
                holds_slot(
                    existing,
                    &appointment.service_type,
                    &appointment.appointment_date,
                    &appointment.appointment_time,
                )
            })
        {
            return Err(StoreError::SlotTaken);
        }

        if appointments
            .values()
            .any(|existing| existing.appointment_number == appointment.appointment_number)
        {
            return Err(StoreError::DuplicateNumber(appointment.appointment_number));
        }

        let id = Uuid::new_v4();
        let stored = appointment.into_appointment(id);
        appointments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.lock().await.get(&id).cloned())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let mut matching: Vec<Appointment> = self
            .appointments
            .lock()
            .await
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            (&a.appointment_date, &a.appointment_time, a.created_at)
                .cmp(&(&b.appointment_date, &b.appointment_time, b.created_at))
        });
        Ok(matching)
    }

    async fn count_active(
        &self,
        service_type: &str,
        appointment_date: &str,
        appointment_time: &str,
    ) -> Result<u64, StoreError> {
        let count = self
            .appointments
            .lock()
            .await
            .values()
            .filter(|existing| holds_slot(existing, service_type, appointment_date, appointment_time))
            .count();
        Ok(count as u64)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut appointments = self.appointments.lock().await;

        if status.is_active() && !expected.is_active() {
            if let Some(target) = appointments.get(&id) {
                let (service, date, time) = (
                    target.service_type.clone(),
                    target.appointment_date.clone(),
                    target.appointment_time.clone(),
                );
                if appointments
                    .values()
                    .any(|other| other.id != id && holds_slot(other, &service, &date, &time))
                {
                    return Err(StoreError::SlotTaken);
                }
            }
        }

        match appointments.get_mut(&id) {
            Some(appointment) if appointment.status == expected => {
                appointment.status = status;
                appointment.updated_at = updated_at;
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.appointments.lock().await.remove(&id).is_some())
    }

    async fn count_by_status(&self) -> Result<Vec<(AppointmentStatus, u64)>, StoreError> {
        let mut counts: HashMap<AppointmentStatus, u64> = HashMap::new();
        for appointment in self.appointments.lock().await.values() {
            *counts.entry(appointment.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(number: &str, time: &str) -> NewAppointment {
        let now = Utc::now();
        NewAppointment {
            appointment_number: number.to_string(),
            service_type: "Dental".to_string(),
            client_name: "A".to_string(),
            client_email: "a@x.com".to_string(),
            client_phone: "555".to_string(),
            appointment_date: "2025-06-10".to_string(),
            appointment_time: time.to_string(),
            purpose: String::new(),
            status: AppointmentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_rejects_taken_slot() {
        let store = InMemoryAppointmentStore::new();
        let first = store.insert(draft("APP-20250101-AAAA", "10:00")).await.unwrap();
        assert_eq!(store.get(first.id).await.unwrap(), Some(first.clone()));

        let clash = store.insert(draft("APP-20250101-BBBB", "10:00")).await;
        assert!(matches!(clash, Err(StoreError::SlotTaken)));

        assert_eq!(store.count_active("Dental", "2025-06-10", "10:00").await.unwrap(), 1);
        assert_eq!(store.count_active("Dental", "2025-06-10", "10:30").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_number() {
        let store = InMemoryAppointmentStore::new();
        store.insert(draft("APP-20250101-AAAA", "10:00")).await.unwrap();
        let duplicate = store.insert(draft("APP-20250101-AAAA", "11:00")).await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateNumber(n)) if n == "APP-20250101-AAAA"));
    }

    #[tokio::test]
    async fn cancelled_appointment_frees_slot() {
        let store = InMemoryAppointmentStore::new();
        let first = store.insert(draft("APP-20250101-AAAA", "10:00")).await.unwrap();

        let updated = store
            .update_status(first.id, AppointmentStatus::Pending, AppointmentStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.map(|a| a.status), Some(AppointmentStatus::Cancelled));

        assert!(store.insert(draft("APP-20250101-BBBB", "10:00")).await.is_ok());
    }

    #[tokio::test]
    async fn update_status_is_conditional_on_expected_status() {
        let store = InMemoryAppointmentStore::new();
        let first = store.insert(draft("APP-20250101-AAAA", "10:00")).await.unwrap();

        let stale = store
            .update_status(first.id, AppointmentStatus::Confirmed, AppointmentStatus::Completed, Utc::now())
            .await
            .unwrap();
        assert!(stale.is_none());

        let missing = store
            .update_status(Uuid::new_v4(), AppointmentStatus::Pending, AppointmentStatus::Confirmed, Utc::now())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn reactivation_respects_the_active_slot() {
        let store = InMemoryAppointmentStore::new();
        let first = store.insert(draft("APP-20250101-AAAA", "10:00")).await.unwrap();
        store
            .update_status(first.id, AppointmentStatus::Pending, AppointmentStatus::Cancelled, Utc::now())
            .await
            .unwrap();
        let second = store.insert(draft("APP-20250101-BBBB", "10:00")).await.unwrap();

        let revived = store
            .update_status(first.id, AppointmentStatus::Cancelled, AppointmentStatus::Pending, Utc::now())
            .await;
        assert!(matches!(revived, Err(StoreError::SlotTaken)));
        assert_eq!(store.count_active("Dental", "2025-06-10", "10:00").await.unwrap(), 1);

        store.delete(second.id).await.unwrap();
        let revived = store
            .update_status(first.id, AppointmentStatus::Cancelled, AppointmentStatus::Pending, Utc::now())
            .await
            .unwrap();
        assert_eq!(revived.map(|a| a.status), Some(AppointmentStatus::Pending));
    }

    #[tokio::test]
    async fn list_is_ordered_and_filtered() {
        let store = InMemoryAppointmentStore::new();
        store.insert(draft("APP-20250101-AAAA", "11:00")).await.unwrap();
        store.insert(draft("APP-20250101-BBBB", "09:30")).await.unwrap();

        let all = store.list(&AppointmentFilter::default()).await.unwrap();
        let times: Vec<&str> = all.iter().map(|a| a.appointment_time.as_str()).collect();
        assert_eq!(times, vec!["09:30", "11:00"]);

        let other_day = store.list(&AppointmentFilter::active_on("Dental", "2025-06-11")).await.unwrap();
        assert!(other_day.is_empty());
    }

    #[tokio::test]
    async fn delete_and_counts() {
        let store = InMemoryAppointmentStore::new();
        let first = store.insert(draft("APP-20250101-AAAA", "10:00")).await.unwrap();
        store.insert(draft("APP-20250101-BBBB", "10:30")).await.unwrap();

        assert!(store.delete(first.id).await.unwrap());
        assert!(!store.delete(first.id).await.unwrap());

        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts, vec![(AppointmentStatus::Pending, 1)]);
    }
}
