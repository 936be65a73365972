use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::availability::AvailabilityWindow;
use crate::models::slots::{is_catalog_slot, SLOT_CATALOG};
use crate::services::store::{BookingStore, StoreError};

#[derive(Debug)]
pub enum SchedulingError {
    OutsideWindow,
    UnknownSlot(String),
    Conflict,
    Store(StoreError),
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::OutsideWindow => write!(f, "date is outside the booking window"),
            SchedulingError::UnknownSlot(label) => write!(f, "{label} is not a bookable time"),
            SchedulingError::Conflict => write!(f, "slot is already booked"),
            SchedulingError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl From<StoreError> for SchedulingError {
    fn from(e: StoreError) -> Self {
        SchedulingError::Store(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotStatus {
    pub time: &'static str,
    pub available: bool,
}

/// Time labels already booked on `date`.
///
/// `own` is the slot currently held by a booking being rescheduled; it is
/// left out so the booking never collides with itself.
pub async fn taken_slots(
    store: &dyn BookingStore,
    date: NaiveDate,
    own: Option<(NaiveDate, &str)>,
) -> Result<BTreeSet<String>, StoreError> {
    let mut taken: BTreeSet<String> = store.taken_times(date).await?.into_iter().collect();
    if let Some((own_date, own_time)) = own {
        if own_date == date {
            taken.remove(own_time);
        }
    }
    Ok(taken)
}

/// Local probe against an already-fetched taken set. A UX hint only.
pub fn check_slot(
    date: NaiveDate,
    time: &str,
    today: NaiveDate,
    taken: &BTreeSet<String>,
) -> Result<(), SchedulingError> {
    if !AvailabilityWindow::starting_from(today).contains(date) {
        return Err(SchedulingError::OutsideWindow);
    }
    if !is_catalog_slot(time) {
        return Err(SchedulingError::UnknownSlot(time.to_string()));
    }
    if taken.contains(time) {
        return Err(SchedulingError::Conflict);
    }
    Ok(())
}

/// Re-queries the store for an exact (date, time) match just before a write.
/// A match held by `own_id` does not count.
pub async fn verify_slot_free(
    store: &dyn BookingStore,
    date: NaiveDate,
    time: &str,
    own_id: Option<&str>,
) -> Result<(), SchedulingError> {
    match store.find_by_slot(date, time).await? {
        Some(existing) if Some(existing.id.as_str()) != own_id => {
            tracing::info!(date = %date, time = %time, holder = %existing.id, "slot lost to a concurrent booking");
            Err(SchedulingError::Conflict)
        }
        _ => Ok(()),
    }
}

/// Availability of every catalog slot on a bookable date.
pub async fn slot_board(
    store: &dyn BookingStore,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Vec<SlotStatus>, SchedulingError> {
    if !AvailabilityWindow::starting_from(today).contains(date) {
        return Err(SchedulingError::OutsideWindow);
    }

    let taken = taken_slots(store, date, None).await?;
    Ok(slot_statuses(&taken))
}

/// Every catalog slot, flagged against `taken`.
pub fn slot_statuses(taken: &BTreeSet<String>) -> Vec<SlotStatus> {
    SLOT_CATALOG
        .iter()
        .map(|&time| SlotStatus {
            time,
            available: !taken.contains(time),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewBooking;
    use crate::services::store::sqlite::SqliteBookingStore;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_booking(date: &str, time: &str) -> NewBooking {
        NewBooking {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+15550001111".to_string(),
            business: "Ana's Bakery".to_string(),
            booking_date: d(date),
            booking_time: time.to_string(),
            notes: None,
            created_at: d("2024-06-01").and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_check_slot_outside_window() {
        let taken = BTreeSet::new();
        let result = check_slot(d("2024-06-06"), "10:00 AM", d("2024-06-01"), &taken);
        assert!(matches!(result, Err(SchedulingError::OutsideWindow)));
        let result = check_slot(d("2024-06-01"), "10:00 AM", d("2024-06-01"), &taken);
        assert!(matches!(result, Err(SchedulingError::OutsideWindow)));
    }

    #[test]
    fn test_check_slot_unknown_label() {
        let taken = BTreeSet::new();
        let result = check_slot(d("2024-06-03"), "06:00 PM", d("2024-06-01"), &taken);
        assert!(matches!(result, Err(SchedulingError::UnknownSlot(_))));
    }

    #[test]
    fn test_check_slot_taken() {
        let taken: BTreeSet<String> = ["10:00 AM".to_string()].into_iter().collect();
        let result = check_slot(d("2024-06-03"), "10:00 AM", d("2024-06-01"), &taken);
        assert!(matches!(result, Err(SchedulingError::Conflict)));
        assert!(check_slot(d("2024-06-03"), "10:30 AM", d("2024-06-01"), &taken).is_ok());
    }

    #[tokio::test]
    async fn test_taken_slots_excludes_own_slot_on_same_date() {
        let store = SqliteBookingStore::open(":memory:").unwrap();
        store.insert(&new_booking("2024-06-03", "10:00 AM")).await.unwrap();
        store.insert(&new_booking("2024-06-03", "11:00 AM")).await.unwrap();

        let own = Some((d("2024-06-03"), "10:00 AM"));
        let taken = taken_slots(&store, d("2024-06-03"), own).await.unwrap();
        assert_eq!(taken.into_iter().collect::<Vec<_>>(), vec!["11:00 AM"]);

        // Own slot only matters on its own date
        let own = Some((d("2024-06-04"), "11:00 AM"));
        let taken = taken_slots(&store, d("2024-06-03"), own).await.unwrap();
        assert_eq!(taken.len(), 2);
    }

    #[tokio::test]
    async fn test_verify_slot_free_ignores_own_booking() {
        let store = SqliteBookingStore::open(":memory:").unwrap();
        let booking = store.insert(&new_booking("2024-06-03", "10:00 AM")).await.unwrap();

        let result = verify_slot_free(&store, d("2024-06-03"), "10:00 AM", None).await;
        assert!(matches!(result, Err(SchedulingError::Conflict)));
        assert!(verify_slot_free(&store, d("2024-06-03"), "10:00 AM", Some(booking.id.as_str()))
            .await
            .is_ok());
        assert!(verify_slot_free(&store, d("2024-06-03"), "10:30 AM", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_slot_board_marks_taken() {
        let store = SqliteBookingStore::open(":memory:").unwrap();
        store.insert(&new_booking("2024-06-03", "10:00 AM")).await.unwrap();

        let board = slot_board(&store, d("2024-06-03"), d("2024-06-01")).await.unwrap();
        assert_eq!(board.len(), 18);
        assert!(!board.iter().find(|s| s.time == "10:00 AM").unwrap().available);
        assert_eq!(board.iter().filter(|s| s.available).count(), 17);

        let outside = slot_board(&store, d("2024-06-07"), d("2024-06-01")).await;
        assert!(matches!(outside, Err(SchedulingError::OutsideWindow)));
    }
}
