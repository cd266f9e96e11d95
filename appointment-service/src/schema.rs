diesel::table! {
    appointments (id) {
        id -> Uuid,
        appointment_number -> Varchar,
        service_type -> Varchar,
        client_name -> Varchar,
        client_email -> Varchar,
        client_phone -> Varchar,
        appointment_date -> Varchar,
        appointment_time -> Varchar,
        purpose -> Varchar,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
