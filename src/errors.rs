use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::scheduling::SchedulingError;
use crate::services::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Booking(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Booking(e) => return e.clone().into_response(),
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Failures of the booking, cancel and reschedule flows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("This time slot is already booked. Please select another time.")]
    SlotTaken,

    #[error("That date is not available. Please pick a date within the next few days.")]
    OutsideWindow,

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid booking. This booking cannot be {0}.")]
    Invalid(&'static str),

    #[error(
        "This booking was created while our system was offline, so it cannot be changed online. \
         Please contact us directly."
    )]
    UnsupportedLegacyBooking,

    #[error("This is already your current booking time.")]
    NoChange,

    #[error("Booking service is unavailable. Please try again later.")]
    StoreUnavailable,

    #[error("booking store error: {0}")]
    Store(String),
}

impl BookingError {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::Validation(_) => "validation",
            BookingError::SlotTaken => "slot_taken",
            BookingError::OutsideWindow => "outside_window",
            BookingError::NotFound(_) => "not_found",
            BookingError::Invalid(_) => "invalid",
            BookingError::UnsupportedLegacyBooking => "unsupported_legacy_booking",
            BookingError::NoChange => "no_change",
            BookingError::StoreUnavailable => "store_unavailable",
            BookingError::Store(_) => "store",
        }
    }

    /// Whether the visitor can fix the problem and try again from the same screen.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::Validation(_)
                | BookingError::SlotTaken
                | BookingError::OutsideWindow
                | BookingError::NoChange
                | BookingError::Store(_)
        )
    }
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => BookingError::StoreUnavailable,
            StoreError::UniqueViolation => BookingError::SlotTaken,
            StoreError::Backend(e) => BookingError::Store(e.to_string()),
        }
    }
}

impl From<SchedulingError> for BookingError {
    fn from(e: SchedulingError) -> Self {
        match e {
            SchedulingError::OutsideWindow => BookingError::OutsideWindow,
            SchedulingError::UnknownSlot(label) => {
                BookingError::Validation(format!("{label} is not a bookable time."))
            }
            SchedulingError::Conflict => BookingError::SlotTaken,
            SchedulingError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match &self {
            BookingError::Validation(_) | BookingError::OutsideWindow => StatusCode::BAD_REQUEST,
            BookingError::SlotTaken | BookingError::NoChange => StatusCode::CONFLICT,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Invalid(_) | BookingError::UnsupportedLegacyBooking => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "retryable": self.is_retryable(),
        });
        (status, axum::Json(body)).into_response()
    }
}
