use anyhow::anyhow;
use async_trait::async_trait;
use booking_core::{Appointment, AppointmentFilter, AppointmentStatus, AppointmentStore, NewAppointment, StoreError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

const ACTIVE_SLOT_CONSTRAINT: &str = "appointments_active_slot_key";
const NUMBER_CONSTRAINT: &str = "appointments_appointment_number_key";

/// Postgres-backed store. Slot exclusivity comes from the partial unique
/// index `appointments_active_slot_key`, so concurrent inserts for one slot
/// are decided by the database.
#[derive(Clone)]
pub struct PgAppointmentStore {
    pool: DbPool,
}

impl PgAppointmentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Backend(anyhow!("failed to check out connection: {}", e)))
    }
}

fn map_write_error(error: DieselError, number: &str) -> StoreError {
    let violated = match &error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            info.constraint_name().map(str::to_owned)
        }
        _ => None,
    };

    match violated.as_deref() {
        Some(ACTIVE_SLOT_CONSTRAINT) => StoreError::SlotTaken,
        Some(NUMBER_CONSTRAINT) => StoreError::DuplicateNumber(number.to_string()),
        _ => StoreError::Backend(error.into()),
    }
}

fn into_appointments(rows: Vec<DbAppointment>) -> Result<Vec<Appointment>, StoreError> {
    rows.into_iter().map(Appointment::try_from).collect()
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn insert(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let mut conn = self.conn().await?;
        let number = appointment.appointment_number.clone();
        let row = NewDbAppointment::from(appointment);

        let stored = diesel::insert_into(appointments::table)
            .values(&row)
            .returning(DbAppointment::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| map_write_error(e, &number))?;

        Appointment::try_from(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let mut conn = self.conn().await?;

        let row = appointments::table
            .find(id)
            .select(DbAppointment::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| StoreError::Backend(e.into()))?;

        row.map(Appointment::try_from).transpose()
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, StoreError> {
        let mut conn = self.conn().await?;

        let mut query = appointments::table.select(DbAppointment::as_select()).into_boxed();
        if let Some(service_type) = &filter.service_type {
            query = query.filter(appointments::service_type.eq(service_type.clone()));
        }
        if let Some(date) = &filter.appointment_date {
            query = query.filter(appointments::appointment_date.eq(date.clone()));
        }
        if let Some(statuses) = &filter.statuses {
            let literals: Vec<String> = statuses.iter().map(ToString::to_string).collect();
            query = query.filter(appointments::status.eq_any(literals));
        }

        let rows = query
            .order((
                appointments::appointment_date.asc(),
                appointments::appointment_time.asc(),
                appointments::created_at.asc(),
            ))
            .load(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        into_appointments(rows)
    }

    async fn count_active(
        &self,
        service_type: &str,
        appointment_date: &str,
        appointment_time: &str,
    ) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let active: Vec<String> = AppointmentStatus::ACTIVE.iter().map(ToString::to_string).collect();

        let count: i64 = appointments::table
            .filter(appointments::service_type.eq(service_type))
            .filter(appointments::appointment_date.eq(appointment_date))
            .filter(appointments::appointment_time.eq(appointment_time))
            .filter(appointments::status.eq_any(active))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        Ok(count.max(0) as u64)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut conn = self.conn().await?;

        let row = diesel::update(
            appointments::table
                .filter(appointments::id.eq(id))
                .filter(appointments::status.eq(expected.to_string())),
        )
        .set((
            appointments::status.eq(status.to_string()),
            appointments::updated_at.eq(updated_at),
        ))
        .returning(DbAppointment::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|e| map_write_error(e, ""))?;

        row.map(Appointment::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;

        let deleted = diesel::delete(appointments::table.filter(appointments::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        Ok(deleted > 0)
    }

    async fn count_by_status(&self) -> Result<Vec<(AppointmentStatus, u64)>, StoreError> {
        let mut conn = self.conn().await?;

        let rows: Vec<(String, i64)> = appointments::table
            .group_by(appointments::status)
            .select((appointments::status, diesel::dsl::count_star()))
            .load(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        rows.into_iter()
            .map(|(status, count)| {
                let status = status
                    .parse::<AppointmentStatus>()
                    .map_err(|_| StoreError::Corrupt(format!("unknown status '{}' in appointments", status)))?;
                Ok((status, count.max(0) as u64))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::DatabaseErrorInformation;

    struct Violation(&'static str);

    impl DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("appointments")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn unique_violation(constraint: &'static str) -> DieselError {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, Box::new(Violation(constraint)))
    }

    #[test]
    fn active_slot_violation_means_slot_taken() {
        let mapped = map_write_error(unique_violation(ACTIVE_SLOT_CONSTRAINT), "APP-20250601-AAAA");
        assert!(matches!(mapped, StoreError::SlotTaken));
    }

    #[test]
    fn number_violation_carries_the_number() {
        let mapped = map_write_error(unique_violation(NUMBER_CONSTRAINT), "APP-20250601-AAAA");
        assert!(matches!(mapped, StoreError::DuplicateNumber(n) if n == "APP-20250601-AAAA"));
    }

    #[test]
    fn other_failures_are_backend_errors() {
        assert!(matches!(
            map_write_error(unique_violation("appointments_pkey"), ""),
            StoreError::Backend(_)
        ));
        assert!(matches!(map_write_error(DieselError::NotFound, ""), StoreError::Backend(_)));
    }
}
