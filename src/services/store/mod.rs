pub mod fallback;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Booking, BookingId, NewBooking, ReminderKind};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("booking store unavailable: {0}")]
    Unavailable(String),

    /// Another booking already holds the (date, time) pair.
    #[error("slot already booked")]
    UniqueViolation,

    #[error(transparent)]
    Backend(anyhow::Error),
}

/// The authoritative booking persistence service.
///
/// Every lookup is an exact match on id, date, time or email. The store
/// assigns ids on insert and reports slot collisions as
/// [`StoreError::UniqueViolation`].
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, StoreError>;

    async fn get(&self, id: &BookingId) -> Result<Option<Booking>, StoreError>;

    async fn taken_times(&self, date: NaiveDate) -> Result<Vec<String>, StoreError>;

    async fn find_by_slot(&self, date: NaiveDate, time: &str) -> Result<Option<Booking>, StoreError>;

    async fn delete(&self, id: &BookingId) -> Result<bool, StoreError>;

    async fn update_schedule(
        &self,
        id: &BookingId,
        date: NaiveDate,
        time: &str,
        notes: &str,
    ) -> Result<bool, StoreError>;

    /// Scheduled bookings dated within `[from, to]`, earliest first.
    async fn upcoming(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, StoreError>;

    async fn mark_reminder_sent(
        &self,
        id: &str,
        kind: ReminderKind,
        at: NaiveDateTime,
    ) -> Result<bool, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError>;

    async fn list(&self, limit: i64) -> Result<Vec<Booking>, StoreError>;
}
