use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, ErrorCode};

use super::{BookingStore, StoreError};
use crate::db::{self, queries};
use crate::models::{Booking, BookingId, NewBooking, ReminderKind};

pub struct SqliteBookingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookingStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = db::init_db(path)?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection poisoned".to_string()))
    }
}

/// Maps a query failure onto the store's error kinds.
fn classify(e: anyhow::Error) -> StoreError {
    if let Some(rusqlite::Error::SqliteFailure(err, _)) = e.downcast_ref::<rusqlite::Error>() {
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::UniqueViolation;
        }
        if matches!(
            err.code,
            ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
        ) {
            return StoreError::Unavailable(e.to_string());
        }
    }
    StoreError::Backend(e)
}

#[async_trait]
impl BookingStore for SqliteBookingStore {
    async fn insert(&self, booking: &NewBooking) -> Result<Booking, StoreError> {
        let id = BookingId::generate();
        let conn = self.conn()?;
        queries::insert_booking(&conn, id.as_str(), booking).map_err(classify)?;

        tracing::info!(booking_id = %id, date = %booking.booking_date, time = %booking.booking_time, "booking stored");

        queries::get_booking_by_id(&conn, id.as_str())
            .map_err(classify)?
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("inserted booking {id} not readable")))
    }

    async fn get(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        let conn = self.conn()?;
        queries::get_booking_by_id(&conn, id.as_str()).map_err(classify)
    }

    async fn taken_times(&self, date: NaiveDate) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        queries::get_taken_times(&conn, &date).map_err(classify)
    }

    async fn find_by_slot(&self, date: NaiveDate, time: &str) -> Result<Option<Booking>, StoreError> {
        let conn = self.conn()?;
        queries::find_booking_by_slot(&conn, &date, time).map_err(classify)
    }

    async fn delete(&self, id: &BookingId) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        queries::delete_booking(&conn, id.as_str()).map_err(classify)
    }

    async fn update_schedule(
        &self,
        id: &BookingId,
        date: NaiveDate,
        time: &str,
        notes: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        queries::update_booking_schedule(&conn, id.as_str(), &date, time, notes).map_err(classify)
    }

    async fn upcoming(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        let conn = self.conn()?;
        queries::get_bookings_in_range(&conn, &from, &to).map_err(classify)
    }

    async fn mark_reminder_sent(
        &self,
        id: &str,
        kind: ReminderKind,
        at: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        queries::mark_reminder_sent(&conn, id, kind, &at).map_err(classify)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Booking>, StoreError> {
        let conn = self.conn()?;
        queries::get_bookings_for_email(&conn, email).map_err(classify)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Booking>, StoreError> {
        let conn = self.conn()?;
        queries::get_all_bookings(&conn, limit).map_err(classify)
    }
}
