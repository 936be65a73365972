use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::models::BookingId;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let booking_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);
    let not_found = || AppError::NotFound("booking not found".to_string());

    let id = BookingId::parse(booking_id).ok_or_else(not_found)?;
    let booking = state.store()?.get(&id).await?.ok_or_else(not_found)?;

    let ics = generate_ics(&booking, &state.config.business_name).ok_or_else(not_found)?;
    let filename = format!("booking-{id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
