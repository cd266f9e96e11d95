use booking_core::*;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::appointments)]
pub struct DbAppointment {
    pub id: Uuid,
    pub appointment_number: String,
    pub service_type: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub purpose: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::appointments)]
pub struct NewDbAppointment {
    pub appointment_number: String,
    pub service_type: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub purpose: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NewAppointment> for NewDbAppointment {
    fn from(appointment: NewAppointment) -> Self {
        Self {
            appointment_number: appointment.appointment_number,
            service_type: appointment.service_type,
            client_name: appointment.client_name,
            client_email: appointment.client_email,
            client_phone: appointment.client_phone,
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            purpose: appointment.purpose,
            status: appointment.status.to_string(),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

impl TryFrom<DbAppointment> for Appointment {
    type Error = StoreError;

    fn try_from(row: DbAppointment) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AppointmentStatus>()
            .map_err(|_| StoreError::Corrupt(format!("appointment {} has status '{}'", row.id, row.status)))?;

        Ok(Self {
            id: row.id,
            appointment_number: row.appointment_number,
            service_type: row.service_type,
            client_name: row.client_name,
            client_email: row.client_email,
            client_phone: row.client_phone,
            appointment_date: row.appointment_date,
            appointment_time: row.appointment_time,
            purpose: row.purpose,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
