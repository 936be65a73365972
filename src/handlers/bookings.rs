use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::BookingError;
use crate::models::availability::month_grid;
use crate::models::slots::is_catalog_slot;
use crate::models::{AvailabilityWindow, Booking, MonthGrid, SLOT_CATALOG};
use crate::services::booking_form::{BookingForm, ContactDetails};
use crate::services::cancel::CancelFlow;
use crate::services::notifications::display_date;
use crate::services::reschedule::RescheduleFlow;
use crate::services::scheduling::{slot_board, slot_statuses, SchedulingError, SlotStatus};
use crate::state::AppState;

/// Public view of a booking reached through a cancel or reschedule link.
#[derive(Serialize)]
pub struct BookingSummary {
    id: String,
    name: String,
    business: String,
    date: Option<NaiveDate>,
    time: Option<String>,
    display_date: Option<String>,
}

impl From<&Booking> for BookingSummary {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            business: b.business.clone(),
            date: b.booking_date,
            time: b.booking_time.clone(),
            display_date: b.booking_date.map(display_date),
        }
    }
}

// GET /api/availability
#[derive(Serialize)]
pub struct AvailabilityResponse {
    first: NaiveDate,
    last: NaiveDate,
    dates: Vec<NaiveDate>,
    slots: &'static [&'static str],
}

pub async fn availability(State(state): State<Arc<AppState>>) -> Json<AvailabilityResponse> {
    let window = AvailabilityWindow::starting_from(state.clock.today());
    Json(AvailabilityResponse {
        first: window.first(),
        last: window.last(),
        dates: window.dates(),
        slots: &SLOT_CATALOG,
    })
}

// GET /api/calendar?year=&month=
#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthGrid>, BookingError> {
    let today = state.clock.today();
    let window = AvailabilityWindow::starting_from(today);
    let year = query.year.unwrap_or(window.first().year());
    let month = query.month.unwrap_or(window.first().month());

    if !window.overlaps_month(year, month) {
        return Err(BookingError::OutsideWindow);
    }
    month_grid(year, month, today)
        .map(Json)
        .ok_or(BookingError::OutsideWindow)
}

// GET /api/slots?date=
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: NaiveDate,
    slots: Vec<SlotStatus>,
}

pub async fn slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, BookingError> {
    let today = state.clock.today();
    if !AvailabilityWindow::starting_from(today).contains(query.date) {
        return Err(BookingError::OutsideWindow);
    }

    let slots = match state.store.as_deref() {
        Some(store) => match slot_board(store, query.date, today).await {
            Ok(slots) => slots,
            Err(SchedulingError::Store(e)) => {
                tracing::warn!(error = %e, date = %query.date, "failed to load taken slots");
                slot_statuses(&BTreeSet::new())
            }
            Err(e) => return Err(e.into()),
        },
        None => slot_statuses(&BTreeSet::new()),
    };

    Ok(Json(SlotsResponse {
        date: query.date,
        slots,
    }))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub business_name: String,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: String,
}

#[derive(Serialize)]
pub struct CreatedBooking {
    id: String,
    date: Option<NaiveDate>,
    time: Option<String>,
    local_only: bool,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreatedBooking>), BookingError> {
    let Some(date) = req.date else {
        return Err(BookingError::Validation(
            "Please fill in all fields and select a time.".to_string(),
        ));
    };

    let mut form = BookingForm::new(state.clock.today());
    if !form.select_date(&state, date).await {
        return Err(BookingError::OutsideWindow);
    }

    let time = req.time.trim();
    if !time.is_empty() && !form.select_time(time) {
        return Err(if is_catalog_slot(time) {
            BookingError::SlotTaken
        } else {
            BookingError::Validation(format!("{time} is not a bookable time."))
        });
    }

    form.set_contact(ContactDetails {
        name: req.name,
        email: req.email,
        phone: req.phone,
        business_name: req.business_name,
    });
    let origin = form.submit(&state).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedBooking {
            id: origin.id().to_string(),
            date: origin.date(),
            time: origin.time().map(str::to_string),
            local_only: origin.is_local_only(),
        }),
    ))
}

#[derive(Deserialize)]
pub struct BookingLinkQuery {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
}

// GET /api/bookings/cancel?id=
pub async fn load_cancel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingLinkQuery>,
) -> Result<Json<BookingSummary>, BookingError> {
    let flow = CancelFlow::load(&state, query.id.as_deref()).await?;
    Ok(Json(BookingSummary::from(flow.booking())))
}

// POST /api/bookings/cancel?id=
#[derive(Serialize)]
pub struct CancelResponse {
    cancelled: bool,
    booking: BookingSummary,
}

pub async fn confirm_cancel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingLinkQuery>,
) -> Result<Json<CancelResponse>, BookingError> {
    let flow = CancelFlow::load(&state, query.id.as_deref()).await?;
    let booking = flow.confirm(&state).await?;
    Ok(Json(CancelResponse {
        cancelled: true,
        booking: BookingSummary::from(&booking),
    }))
}

// GET /api/bookings/reschedule?id=[&date=]
#[derive(Serialize)]
pub struct RescheduleView {
    booking: BookingSummary,
    window: AvailabilityWindow,
    selected_date: NaiveDate,
    selected_time: Option<String>,
    slots: Vec<SlotStatus>,
}

pub async fn load_reschedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingLinkQuery>,
) -> Result<Json<RescheduleView>, BookingError> {
    let mut flow = RescheduleFlow::load(&state, query.id.as_deref()).await?;
    if let Some(date) = query.date {
        flow.select_date(&state, date).await;
    }

    Ok(Json(RescheduleView {
        booking: BookingSummary::from(flow.booking()),
        window: AvailabilityWindow::starting_from(state.clock.today()),
        selected_date: flow.selected_date(),
        selected_time: flow.selected_time().map(str::to_string),
        slots: slot_statuses(flow.taken()),
    }))
}

// POST /api/bookings/reschedule?id=
#[derive(Deserialize)]
pub struct RescheduleRequestBody {
    pub date: NaiveDate,
    #[serde(default)]
    pub time: String,
}

pub async fn confirm_reschedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingLinkQuery>,
    Json(body): Json<RescheduleRequestBody>,
) -> Result<Json<BookingSummary>, BookingError> {
    let mut flow = RescheduleFlow::load(&state, query.id.as_deref()).await?;

    if body.date != flow.selected_date() && !flow.select_date(&state, body.date).await {
        return Err(BookingError::OutsideWindow);
    }

    let time = body.time.trim();
    if time.is_empty() {
        return Err(BookingError::Validation("Please select a new time.".to_string()));
    }
    if !flow.select_time(time) {
        return Err(if is_catalog_slot(time) {
            BookingError::SlotTaken
        } else {
            BookingError::Validation(format!("{time} is not a bookable time."))
        });
    }

    let booking = flow.confirm(&state).await?;
    Ok(Json(BookingSummary::from(&booking)))
}
