use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::reminders::{run_sweep, SweepReport};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub email: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    name: String,
    email: String,
    phone: String,
    business: String,
    booking_date: Option<String>,
    booking_time: Option<String>,
    notes: Option<String>,
    status: Option<String>,
    created_at: String,
    reminder_1day_sent_at: Option<String>,
    reminder_starting_soon_sent_at: Option<String>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        let timestamp = |t: chrono::NaiveDateTime| t.format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            id: b.id,
            name: b.name,
            email: b.email,
            phone: b.phone,
            business: b.business,
            booking_date: b.booking_date.map(|d| d.format("%Y-%m-%d").to_string()),
            booking_time: b.booking_time,
            notes: b.notes,
            status: b.status,
            created_at: timestamp(b.created_at),
            reminder_1day_sent_at: b.reminder_1day_sent_at.map(timestamp),
            reminder_starting_soon_sent_at: b.reminder_starting_soon_sent_at.map(timestamp),
        }
    }
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let store = state.store()?;
    let bookings = match query.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(email) => store.find_by_email(email).await?,
        None => store.list(query.limit.unwrap_or(50).clamp(1, 500)).await?,
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

// GET|POST /api/reminders/sweep
pub async fn sweep_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let report = run_sweep(&state, state.clock.now()).await?;
    Ok(Json(report))
}
