use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::errors::BookingError;
use crate::models::availability::is_date_available;
use crate::models::slots::is_catalog_slot;
use crate::models::{Booking, BookingId, RescheduleRequest};
use crate::services::cancel::load_booking;
use crate::services::notifications::display_date;
use crate::services::scheduling::{check_slot, taken_slots, verify_slot_free};
use crate::state::AppState;

/// Moves an existing booking to a new slot.
pub struct RescheduleFlow {
    today: NaiveDate,
    id: BookingId,
    booking: Booking,
    current_date: NaiveDate,
    current_time: String,
    selected_date: NaiveDate,
    selected_time: Option<String>,
    taken: BTreeSet<String>,
}

impl RescheduleFlow {
    /// Loads the booking and pre-selects its current slot.
    pub async fn load(state: &AppState, raw_id: Option<&str>) -> Result<Self, BookingError> {
        let (id, booking) = load_booking(state, raw_id, "rescheduled").await?;
        let Some((date, time)) = booking.slot() else {
            return Err(BookingError::Invalid("rescheduled"));
        };
        let (current_date, current_time) = (date, time.to_string());

        let mut flow = Self {
            today: state.clock.today(),
            id,
            booking,
            current_date,
            selected_date: current_date,
            selected_time: Some(current_time.clone()),
            current_time,
            taken: BTreeSet::new(),
        };
        flow.refresh_taken(state).await;
        Ok(flow)
    }

    pub fn booking(&self) -> &Booking {
        &self.booking
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

    pub async fn select_date(&mut self, state: &AppState, date: NaiveDate) -> bool {
        if !is_date_available(date, self.today) {
            return false;
        }
        self.selected_date = date;
        self.selected_time = None;
        self.refresh_taken(state).await;
        true
    }

    pub fn select_time(&mut self, time: &str) -> bool {
        if !is_catalog_slot(time) || self.taken.contains(time) {
            return false;
        }
        self.selected_time = Some(time.to_string());
        true
    }

    async fn refresh_taken(&mut self, state: &AppState) {
        let own = Some((self.current_date, self.current_time.as_str()));
        self.taken = match state.store() {
            Ok(store) => taken_slots(store, self.selected_date, own)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, date = %self.selected_date, "failed to load taken slots");
                    BTreeSet::new()
                }),
            Err(_) => BTreeSet::new(),
        };
    }

    /// Applies the selected slot. On success the flow reflects the new slot,
    /// so a further confirm without changes reports [`BookingError::NoChange`].
    pub async fn confirm(&mut self, state: &AppState) -> Result<Booking, BookingError> {
        let result = self.try_confirm(state).await;
        if let Err(e) = &result {
            tracing::info!(booking_id = %self.id, error = %e, kind = e.kind(), "reschedule rejected");
            if matches!(e, BookingError::SlotTaken) {
                self.selected_time = None;
                self.refresh_taken(state).await;
            }
        }
        result
    }

    async fn try_confirm(&mut self, state: &AppState) -> Result<Booking, BookingError> {
        let Some(time) = self.selected_time.clone() else {
            return Err(BookingError::Validation("Please select a new time.".to_string()));
        };
        let date = self.selected_date;

        if date == self.current_date && time == self.current_time {
            return Err(BookingError::NoChange);
        }

        check_slot(date, &time, self.today, &self.taken)?;

        let store = state.store()?;
        verify_slot_free(store, date, &time, Some(self.id.as_str())).await?;

        let note = format!(
            "Rescheduled from {} at {} to {} at {}",
            self.current_date.format("%Y-%m-%d"),
            self.current_time,
            date.format("%Y-%m-%d"),
            time
        );
        let notes = match self.booking.notes.as_deref().filter(|n| !n.is_empty()) {
            Some(existing) => format!("{existing} | {note}"),
            None => note,
        };

        if !store.update_schedule(&self.id, date, &time, &notes).await? {
            return Err(BookingError::NotFound("Booking not found.".to_string()));
        }
        let updated = store
            .get(&self.id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found.".to_string()))?;

        tracing::info!(
            booking_id = %self.id,
            from_date = %self.current_date,
            from_time = %self.current_time,
            to_date = %date,
            to_time = %time,
            "booking rescheduled"
        );

        let req = RescheduleRequest {
            email: updated.email.clone(),
            name: updated.name.clone(),
            old_date: display_date(self.current_date),
            old_time: self.current_time.clone(),
            new_date: display_date(date),
            new_time: time.clone(),
            business_name: Some(updated.business.clone()).filter(|b| !b.is_empty()),
            booking_id: Some(updated.id.clone()),
        };
        let response = state.notifier.send_reschedule(&req).await;
        if !response.success {
            tracing::warn!(
                booking_id = %self.id,
                error = response.error.as_deref().unwrap_or("unknown"),
                "reschedule notice not delivered"
            );
        }

        self.current_date = date;
        self.current_time = time;
        self.booking = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::db;
    use crate::services::store::sqlite::SqliteBookingStore;
    use crate::services::testing::{build_state, new_booking, noon, test_state};

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[tokio::test]
    async fn test_load_preselects_current_slot() {
        let (state, _) = test_state();
        let booking = state.store().unwrap().insert(&new_booking(june(3), "10:00 AM")).await.unwrap();

        let flow = RescheduleFlow::load(&state, Some(&booking.id)).await.unwrap();
        assert_eq!(flow.selected_date(), june(3));
        assert_eq!(flow.selected_time(), Some("10:00 AM"));
        // own slot never shows as taken
        assert!(flow.taken().is_empty());
    }

    #[tokio::test]
    async fn test_same_slot_is_no_change() {
        let (state, sent) = test_state();
        let booking = state.store().unwrap().insert(&new_booking(june(3), "10:00 AM")).await.unwrap();

        let mut flow = RescheduleFlow::load(&state, Some(&booking.id)).await.unwrap();
        let err = flow.confirm(&state).await.unwrap_err();
        assert_eq!(err, BookingError::NoChange);

        let unchanged = state
            .store()
            .unwrap()
            .get(&BookingId::parse(&booking.id).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged, booking);
        assert!(sent.reschedules().is_empty());
    }

    #[tokio::test]
    async fn test_moves_within_same_date() {
        let (state, sent) = test_state();
        let store = state.store().unwrap();
        let booking = store.insert(&new_booking(june(3), "10:00 AM")).await.unwrap();

        let mut flow = RescheduleFlow::load(&state, Some(&booking.id)).await.unwrap();
        assert!(flow.select_time("10:30 AM"));
        let updated = flow.confirm(&state).await.unwrap();

        assert_eq!(updated.booking_time.as_deref(), Some("10:30 AM"));
        assert_eq!(
            updated.notes.as_deref(),
            Some("Scheduled call | Rescheduled from 2024-06-03 at 10:00 AM to 2024-06-03 at 10:30 AM")
        );
        assert_eq!(store.taken_times(june(3)).await.unwrap(), vec!["10:30 AM"]);

        let reschedules = sent.reschedules();
        assert_eq!(reschedules.len(), 1);
        assert_eq!(reschedules[0].old_time, "10:00 AM");
        assert_eq!(reschedules[0].new_date, "Monday, June 3, 2024");
    }

    #[tokio::test]
    async fn test_date_change_clears_time() {
        let (state, _) = test_state();
        let store = state.store().unwrap();
        let booking = store.insert(&new_booking(june(3), "10:00 AM")).await.unwrap();
        store.insert(&new_booking(june(4), "02:00 PM")).await.unwrap();

        let mut flow = RescheduleFlow::load(&state, Some(&booking.id)).await.unwrap();
        assert!(flow.select_date(&state, june(4)).await);
        assert_eq!(flow.selected_time(), None);
        assert!(flow.taken().contains("02:00 PM"));
        assert!(!flow.select_time("02:00 PM"));

        let err = flow.confirm(&state).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        assert!(!flow.select_date(&state, june(6)).await);
        assert_eq!(flow.selected_date(), june(4));
    }

    #[tokio::test]
    async fn test_slot_taken_by_other_booking_between_load_and_confirm() {
        let (state, _) = test_state();
        let store = state.store().unwrap();
        let booking = store.insert(&new_booking(june(3), "10:00 AM")).await.unwrap();

        let mut flow = RescheduleFlow::load(&state, Some(&booking.id)).await.unwrap();
        assert!(flow.select_date(&state, june(5)).await);
        assert!(flow.select_time("09:00 AM"));

        store.insert(&new_booking(june(5), "09:00 AM")).await.unwrap();

        let err = flow.confirm(&state).await.unwrap_err();
        assert_eq!(err, BookingError::SlotTaken);
        assert_eq!(flow.selected_time(), None);
        assert!(flow.taken().contains("09:00 AM"));
    }

    #[tokio::test]
    async fn test_booking_outside_window_cannot_keep_stale_date() {
        let (state, _) = test_state();
        // booked earlier for what is now today
        let booking = state.store().unwrap().insert(&new_booking(june(1), "10:00 AM")).await.unwrap();

        let mut flow = RescheduleFlow::load(&state, Some(&booking.id)).await.unwrap();
        assert!(flow.select_time("11:00 AM"));
        let err = flow.confirm(&state).await.unwrap_err();
        assert_eq!(err, BookingError::OutsideWindow);
    }

    #[tokio::test]
    async fn test_booking_without_slot_is_invalid() {
        let conn = db::init_db(":memory:").unwrap();
        let id = BookingId::generate();
        conn.execute(
            "INSERT INTO bookings (id, name, email) VALUES (?1, 'Old Lead', 'old@example.com')",
            [id.as_str()],
        )
        .unwrap();
        let store = SqliteBookingStore::new(Arc::new(Mutex::new(conn)));
        let (state, _) = build_state(Some(Box::new(store)), noon(), false);

        let err = RescheduleFlow::load(&state, Some(id.as_str())).await.err().unwrap();
        assert_eq!(err, BookingError::Invalid("rescheduled"));
        assert_eq!(err.to_string(), "Invalid booking. This booking cannot be rescheduled.");
    }
}
