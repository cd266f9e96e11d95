use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use booking_core::BookingError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

/// HTTP-facing errors. Booking errors keep their kind so each maps to its
/// own status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("authentication required: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Booking(BookingError::Validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::NotFound(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Booking(BookingError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string())
            }
            ApiError::Booking(BookingError::SlotUnavailable { .. }) => {
                (StatusCode::BAD_REQUEST, "SLOT_UNAVAILABLE", "Time slot is not available".to_string())
            }
            ApiError::Booking(BookingError::InvalidTransition { .. }) => {
                (StatusCode::BAD_REQUEST, "INVALID_TRANSITION", self.to_string())
            }
            ApiError::Booking(BookingError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Appointment not found".to_string())
            }
            ApiError::Booking(BookingError::Forbidden) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string())
            }
            ApiError::Booking(BookingError::Storage(e)) => {
                tracing::error!("Storage failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "An internal error occurred".to_string())
            }
            ApiError::Booking(BookingError::Notification(e)) => {
                tracing::error!("Notification failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFICATION_ERROR",
                    "Notification could not be sent".to_string(),
                )
            }
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code,
        };
        (status, Json(body)).into_response()
    }
}
