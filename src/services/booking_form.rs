use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::BookingError;
use crate::models::availability::{is_date_available, navigate_month, AvailabilityWindow};
use crate::models::booking::DEFAULT_BUSINESS;
use crate::models::slots::is_catalog_slot;
use crate::models::{BookingOrigin, ConfirmationRequest, NewBooking};
use crate::services::notifications::display_date;
use crate::services::scheduling::{check_slot, taken_slots, verify_slot_free, SchedulingError};
use crate::services::store::StoreError;
use crate::state::AppState;

const MISSING_FIELDS: &str = "Please fill in all fields and select a time.";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub business_name: String,
}

impl ContactDetails {
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            business_name: self.business_name.trim().to_string(),
        }
    }

    fn has_required(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty() && !self.phone.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormStage {
    SelectingDateTime,
    Reviewing,
    Submitting,
    Success(BookingOrigin),
    /// The form stays open; the visitor can fix the input and resubmit.
    Error(BookingError),
}

/// The lead-capture booking form: date/time picking, probing, submission.
pub struct BookingForm {
    today: NaiveDate,
    selected_date: NaiveDate,
    selected_time: Option<String>,
    taken: BTreeSet<String>,
    contact: ContactDetails,
    stage: FormStage,
}

impl BookingForm {
    /// Starts on tomorrow with no time picked. Call [`refresh_taken`] to
    /// load the first date's bookings.
    ///
    /// [`refresh_taken`]: BookingForm::refresh_taken
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            selected_date: AvailabilityWindow::starting_from(today).first(),
            selected_time: None,
            taken: BTreeSet::new(),
            contact: ContactDetails::default(),
            stage: FormStage::SelectingDateTime,
        }
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn selected_time(&self) -> Option<&str> {
        self.selected_time.as_deref()
    }

    pub fn taken(&self) -> &BTreeSet<String> {
        &self.taken
    }

    pub fn stage(&self) -> &FormStage {
        &self.stage
    }

    pub fn set_contact(&mut self, contact: ContactDetails) {
        self.contact = contact;
    }

    /// Picks a date. Dates outside the window are ignored.
    pub async fn select_date(&mut self, state: &AppState, date: NaiveDate) -> bool {
        if !is_date_available(date, self.today) {
            return false;
        }
        self.selected_date = date;
        self.refresh_taken(state).await;
        true
    }

    pub async fn change_month(&mut self, state: &AppState, delta: i32) -> bool {
        let Some(date) = navigate_month(self.selected_date, delta, self.today) else {
            return false;
        };
        if date != self.selected_date {
            self.selected_date = date;
            self.refresh_taken(state).await;
        }
        true
    }

    /// Reloads the taken slots for the selected date, dropping the picked
    /// time if someone else has booked it meanwhile.
    pub async fn refresh_taken(&mut self, state: &AppState) {
        self.taken = match state.store.as_deref() {
            Some(store) => taken_slots(store, self.selected_date, None)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, date = %self.selected_date, "failed to load taken slots");
                    BTreeSet::new()
                }),
            None => BTreeSet::new(),
        };

        if let Some(time) = &self.selected_time {
            if self.taken.contains(time) {
                tracing::info!(date = %self.selected_date, time = %time, "selected slot was taken, clearing");
                self.selected_time = None;
                self.stage = FormStage::SelectingDateTime;
            }
        }
    }

    pub fn select_time(&mut self, time: &str) -> bool {
        if !is_catalog_slot(time) || self.taken.contains(time) {
            return false;
        }
        self.selected_time = Some(time.to_string());
        self.stage = FormStage::Reviewing;
        true
    }

    pub async fn submit(&mut self, state: &AppState) -> Result<BookingOrigin, BookingError> {
        let result = self.try_submit(state).await;
        match &result {
            Ok(origin) => {
                tracing::info!(
                    booking_id = %origin.id(),
                    local_only = origin.is_local_only(),
                    "booking submitted"
                );
                self.stage = FormStage::Success(origin.clone());
            }
            Err(e) => {
                tracing::info!(error = %e, kind = e.kind(), "booking rejected");
                if matches!(e, BookingError::SlotTaken) {
                    self.refresh_taken(state).await;
                }
                self.stage = FormStage::Error(e.clone());
            }
        }
        result
    }

    async fn try_submit(&mut self, state: &AppState) -> Result<BookingOrigin, BookingError> {
        let contact = self.contact.trimmed();
        let time = match &self.selected_time {
            Some(time) if contact.has_required() => time.clone(),
            _ => return Err(BookingError::Validation(MISSING_FIELDS.to_string())),
        };
        let date = self.selected_date;

        check_slot(date, &time, self.today, &self.taken)?;

        self.stage = FormStage::Submitting;
        let booking = self.new_booking(&contact, date, &time, state);

        let origin = match state.store.as_deref() {
            Some(store) => {
                match verify_slot_free(store, date, &time, None).await {
                    Ok(()) => {}
                    Err(SchedulingError::Store(StoreError::Unavailable(reason))) => {
                        tracing::warn!(reason = %reason, "store unreachable during race check");
                        return save_local(state, booking);
                    }
                    Err(e) => return Err(e.into()),
                }

                match store.insert(&booking).await {
                    Ok(stored) => BookingOrigin::Stored(stored),
                    Err(StoreError::Unavailable(reason)) => {
                        tracing::warn!(reason = %reason, "store unreachable on insert");
                        save_local(state, booking)?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => save_local(state, booking)?,
        };

        send_confirmation(state, &origin, &contact).await;
        Ok(origin)
    }

    fn new_booking(
        &self,
        contact: &ContactDetails,
        date: NaiveDate,
        time: &str,
        state: &AppState,
    ) -> NewBooking {
        let mut notes = format!("Scheduled call: {} at {time}", display_date(date));
        if !contact.business_name.is_empty() {
            notes.push_str(&format!(" | Business: {}", contact.business_name));
        }

        NewBooking {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            business: if contact.business_name.is_empty() {
                DEFAULT_BUSINESS.to_string()
            } else {
                contact.business_name.clone()
            },
            booking_date: date,
            booking_time: time.to_string(),
            notes: Some(notes),
            created_at: state.clock.now(),
        }
    }
}

fn save_local(state: &AppState, booking: NewBooking) -> Result<BookingOrigin, BookingError> {
    state
        .fallback
        .save(booking)
        .map(BookingOrigin::LocalOnly)
        .map_err(|e| BookingError::Store(e.to_string()))
}

async fn send_confirmation(state: &AppState, origin: &BookingOrigin, contact: &ContactDetails) {
    let (Some(date), Some(time)) = (origin.date(), origin.time()) else {
        return;
    };

    let req = ConfirmationRequest {
        email: contact.email.clone(),
        name: contact.name.clone(),
        date: display_date(date),
        time: time.to_string(),
        business_name: Some(contact.business_name.clone()).filter(|b| !b.is_empty()),
        // Local ids cannot be cancelled or rescheduled, so no links for them.
        booking_id: match origin {
            BookingOrigin::Stored(b) => Some(b.id.clone()),
            BookingOrigin::LocalOnly(_) => None,
        },
        phone: Some(contact.phone.clone()),
    };

    let response = state.notifier.send_confirmation(&req).await;
    if !response.success {
        tracing::warn!(
            booking_id = %origin.id(),
            error = response.error.as_deref().unwrap_or("unknown"),
            "confirmation not delivered"
        );
    }
}
