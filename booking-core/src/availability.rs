use std::collections::HashSet;
use std::sync::Arc;

use crate::config::SlotConfig;
use crate::error::BookingError;
use crate::models::AppointmentFilter;
use crate::store::AppointmentStore;

/// Answers "which slots are free" for a service on a date. Holds no state
/// besides its configuration; every call reads the store afresh.
#[derive(Clone)]
pub struct AvailabilityEngine {
    store: Arc<dyn AppointmentStore>,
    config: SlotConfig,
}

impl AvailabilityEngine {
    pub fn new(store: Arc<dyn AppointmentStore>, config: SlotConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub async fn list_available_slots(
        &self,
        service_type: &str,
        appointment_date: &str,
    ) -> Result<Vec<String>, BookingError> {
        let booked = self
            .store
            .list(&AppointmentFilter::active_on(service_type, appointment_date))
            .await?;

        let occupied: HashSet<String> = booked.into_iter().map(|a| a.appointment_time).collect();

        Ok(self
            .config
            .candidate_slots()
            .into_iter()
            .filter(|slot| !occupied.contains(slot))
            .collect())
    }

    pub async fn is_available(
        &self,
        service_type: &str,
        appointment_date: &str,
        appointment_time: &str,
    ) -> Result<bool, BookingError> {
        let count = self
            .store
            .count_active(service_type, appointment_date, appointment_time)
            .await?;
        Ok(count == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::memory::InMemoryAppointmentStore;
    use crate::models::{AppointmentStatus, NewAppointment};
    use crate::store::MockAppointmentStore;
    use chrono::Utc;

    async fn book(store: &InMemoryAppointmentStore, service: &str, time: &str, status: AppointmentStatus) {
        let now = Utc::now();
        store
            .insert(NewAppointment {
                appointment_number: format!("APP-20250601-{}", &time.replace(':', "")),
                service_type: service.to_string(),
                client_name: "A".to_string(),
                client_email: "a@x.com".to_string(),
                client_phone: "555".to_string(),
                appointment_date: "2025-06-10".to_string(),
                appointment_time: time.to_string(),
                purpose: String::new(),
                status,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_day_lists_every_slot() {
        let engine = AvailabilityEngine::new(Arc::new(InMemoryAppointmentStore::new()), SlotConfig::default());
        let slots = engine.list_available_slots("Dental", "2025-06-10").await.unwrap();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots, SlotConfig::default().candidate_slots());
    }

    #[tokio::test]
    async fn only_active_bookings_of_the_same_service_occupy_slots() {
        let store = Arc::new(InMemoryAppointmentStore::new());
        book(&store, "Dental", "10:00", AppointmentStatus::Pending).await;
        book(&store, "Dental", "11:00", AppointmentStatus::Confirmed).await;
        book(&store, "Dental", "12:00", AppointmentStatus::Completed).await;
        book(&store, "Dental", "13:00", AppointmentStatus::Cancelled).await;
        book(&store, "Optometry", "14:00", AppointmentStatus::Pending).await;

        let engine = AvailabilityEngine::new(store, SlotConfig::default());
        let slots = engine.list_available_slots("Dental", "2025-06-10").await.unwrap();

        assert_eq!(slots.len(), 14);
        assert!(!slots.contains(&"10:00".to_string()));
        assert!(!slots.contains(&"11:00".to_string()));
        assert!(slots.contains(&"12:00".to_string()));
        assert!(slots.contains(&"13:00".to_string()));
        assert!(slots.contains(&"14:00".to_string()));

        assert!(!engine.is_available("Dental", "2025-06-10", "10:00").await.unwrap());
        assert!(engine.is_available("Dental", "2025-06-10", "12:00").await.unwrap());
        assert!(engine.is_available("Dental", "2025-06-11", "10:00").await.unwrap());
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let store = Arc::new(InMemoryAppointmentStore::new());
        book(&store, "Dental", "15:30", AppointmentStatus::Pending).await;
        let engine = AvailabilityEngine::new(store, SlotConfig::default());

        let first = engine.list_available_slots("Dental", "2025-06-10").await.unwrap();
        let second = engine.list_available_slots("Dental", "2025-06-10").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut store = MockAppointmentStore::new();
        store
            .expect_list()
            .returning(|_| Err(StoreError::Backend(anyhow::anyhow!("connection reset"))));

        let engine = AvailabilityEngine::new(Arc::new(store), SlotConfig::default());
        let result = engine.list_available_slots("Dental", "2025-06-10").await;
        assert!(matches!(result, Err(BookingError::Storage(_))));
    }
}
