use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, StatusCode},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use booking_core::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleManager,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data })
    }
}

/// Principal forwarded by the identity gateway in `x-user-id` and
/// `x-user-role`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let uid = header(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;
        let role = header(USER_ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        Ok(Authenticated(Principal { uid, role }))
    }
}

/// JSON body whose rejections render as [`ApiError`].
#[derive(Debug)]
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// Path parameters whose rejections render as [`ApiError`].
#[derive(Debug)]
pub struct AppPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(AppPath(value))
    }
}

impl Authenticated {
    fn require_staff(&self) -> Result<&Principal, ApiError> {
        if self.0.is_staff() {
            Ok(&self.0)
        } else {
            Err(BookingError::Forbidden.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub service_type: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub purpose: Option<String>,
}

impl From<CreateAppointmentRequest> for BookingRequest {
    fn from(request: CreateAppointmentRequest) -> Self {
        Self {
            service_type: request.service_type.unwrap_or_default(),
            client: ClientInfo {
                name: request.client_name.unwrap_or_default(),
                email: request.client_email.unwrap_or_default(),
                phone: request.client_phone.unwrap_or_default(),
            },
            appointment_date: request.appointment_date.unwrap_or_default(),
            appointment_time: request.appointment_time.unwrap_or_default(),
            purpose: request.purpose,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAppointmentsQuery {
    pub service_type: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub service_type: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub service_type: String,
    pub date: String,
    pub slots: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/appointments", post(create_appointment).get(list_appointments))
        .route("/appointments/:id", get(get_appointment).delete(cancel_appointment))
        .route("/appointments/:id/status", put(update_status))
        .route("/appointments/:id/reminder", post(send_reminder))
        .route("/admin/appointments/:id", delete(purge_appointment))
        .route("/availability", get(check_availability))
        .route("/statistics", get(get_statistics))
        .route("/health", get(health_check))
        .fallback(endpoint_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn create_appointment(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Appointment>>), ApiError> {
    let appointment = state.lifecycle.create_appointment(request.into()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(appointment)))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, ApiError> {
    let statuses = non_empty(query.status)
        .map(|status| status.parse::<AppointmentStatus>().map(|s| vec![s]))
        .transpose()?;

    let filter = AppointmentFilter {
        service_type: non_empty(query.service_type),
        statuses,
        appointment_date: non_empty(query.date),
    };

    let appointments = state.lifecycle.list_appointments(&filter).await?;
    Ok(ApiResponse::ok(appointments))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    Ok(ApiResponse::ok(state.lifecycle.get_appointment(id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    principal: Authenticated,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let staff = principal.require_staff()?;
    let status = non_empty(request.status).ok_or_else(|| ApiError::BadRequest("status is required".to_string()))?;

    let appointment = state.lifecycle.update_status(id, &status).await?;
    tracing::info!("Staff {} set appointment {} to {}", staff.uid, id, appointment.status);
    Ok(ApiResponse::ok(appointment))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    Ok(ApiResponse::ok(state.lifecycle.cancel_appointment(id).await?))
}

pub async fn send_reminder(
    State(state): State<AppState>,
    principal: Authenticated,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    principal.require_staff()?;
    state.lifecycle.send_reminder(id).await?;
    Ok(ApiResponse::ok("Reminder sent"))
}

pub async fn purge_appointment(
    State(state): State<AppState>,
    principal: Authenticated,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let staff = principal.require_staff()?;
    state.lifecycle.delete_appointment(id).await?;
    tracing::info!("Staff {} deleted appointment {}", staff.uid, id);
    Ok(ApiResponse::ok("Appointment deleted"))
}

pub async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<ApiResponse<AvailabilityResponse>>, ApiError> {
    let (Some(service_type), Some(date)) = (non_empty(query.service_type), non_empty(query.date)) else {
        return Err(ApiError::BadRequest("service_type and date are required".to_string()));
    };

    let slots = state
        .lifecycle
        .availability()
        .list_available_slots(&service_type, &date)
        .await?;

    Ok(ApiResponse::ok(AvailabilityResponse { service_type, date, slots }))
}

pub async fn get_statistics(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<ApiResponse<Statistics>>, ApiError> {
    Ok(ApiResponse::ok(state.lifecycle.compute_statistics(principal.role).await?))
}

async fn endpoint_not_found() -> ApiError {
    ApiError::NotFound("Endpoint not found".to_string())
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "appointment-service",
        timestamp: chrono::Utc::now(),
    })
}
