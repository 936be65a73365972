//! Shared fixtures for the controller unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::config::AppConfig;
use crate::models::{
    Booking, BookingId, CancellationRequest, ConfirmationRequest, NewBooking, NotificationResponse,
    ReminderKind, ReminderRequest, RescheduleRequest,
};
use crate::services::clock::FixedClock;
use crate::services::notifications::NotificationDispatch;
use crate::services::store::fallback::LocalFallbackStore;
use crate::services::store::sqlite::SqliteBookingStore;
use crate::services::store::{BookingStore, StoreError};
use crate::state::AppState;

#[derive(Default)]
struct SentLog {
    confirmations: Vec<ConfirmationRequest>,
    cancellations: Vec<CancellationRequest>,
    reschedules: Vec<RescheduleRequest>,
    reminders: Vec<(ReminderKind, ReminderRequest)>,
}

/// Handle onto everything a [`RecordingNotifier`] was asked to send.
#[derive(Clone, Default)]
pub struct Sent(Arc<Mutex<SentLog>>);

impl Sent {
    pub fn confirmations(&self) -> Vec<ConfirmationRequest> {
        self.0.lock().unwrap().confirmations.clone()
    }

    pub fn cancellations(&self) -> Vec<CancellationRequest> {
        self.0.lock().unwrap().cancellations.clone()
    }

    pub fn reschedules(&self) -> Vec<RescheduleRequest> {
        self.0.lock().unwrap().reschedules.clone()
    }

    pub fn reminders(&self) -> Vec<(ReminderKind, ReminderRequest)> {
        self.0.lock().unwrap().reminders.clone()
    }
}

pub struct RecordingNotifier {
    sent: Sent,
    fail: bool,
}

impl RecordingNotifier {
    fn outcome(&self) -> NotificationResponse {
        if self.fail {
            NotificationResponse::failed("provider down")
        } else {
            NotificationResponse::ok()
        }
    }
}

#[async_trait]
impl NotificationDispatch for RecordingNotifier {
    async fn send_confirmation(&self, req: &ConfirmationRequest) -> NotificationResponse {
        self.sent.0.lock().unwrap().confirmations.push(req.clone());
        self.outcome()
    }

    async fn send_cancellation(&self, req: &CancellationRequest) -> NotificationResponse {
        self.sent.0.lock().unwrap().cancellations.push(req.clone());
        self.outcome()
    }

    async fn send_reschedule(&self, req: &RescheduleRequest) -> NotificationResponse {
        self.sent.0.lock().unwrap().reschedules.push(req.clone());
        self.outcome()
    }

    async fn send_reminder(&self, kind: ReminderKind, req: &ReminderRequest) -> NotificationResponse {
        self.sent.0.lock().unwrap().reminders.push((kind, req.clone()));
        self.outcome()
    }
}

/// A store that is configured but never reachable.
pub struct UnreachableStore;

fn unreachable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl BookingStore for UnreachableStore {
    async fn insert(&self, _booking: &NewBooking) -> Result<Booking, StoreError> {
        unreachable()
    }

    async fn get(&self, _id: &BookingId) -> Result<Option<Booking>, StoreError> {
        unreachable()
    }

    async fn taken_times(&self, _date: NaiveDate) -> Result<Vec<String>, StoreError> {
        unreachable()
    }

    async fn find_by_slot(&self, _date: NaiveDate, _time: &str) -> Result<Option<Booking>, StoreError> {
        unreachable()
    }

    async fn delete(&self, _id: &BookingId) -> Result<bool, StoreError> {
        unreachable()
    }

    async fn update_schedule(
        &self,
        _id: &BookingId,
        _date: NaiveDate,
        _time: &str,
        _notes: &str,
    ) -> Result<bool, StoreError> {
        unreachable()
    }

    async fn upcoming(&self, _from: NaiveDate, _to: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        unreachable()
    }

    async fn mark_reminder_sent(
        &self,
        _id: &str,
        _kind: ReminderKind,
        _at: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        unreachable()
    }

    async fn find_by_email(&self, _email: &str) -> Result<Vec<Booking>, StoreError> {
        unreachable()
    }

    async fn list(&self, _limit: i64) -> Result<Vec<Booking>, StoreError> {
        unreachable()
    }
}

/// Reports every slot as free, then loses the insert to the unique index.
pub struct ConstraintLosingStore;

#[async_trait]
impl BookingStore for ConstraintLosingStore {
    async fn insert(&self, _booking: &NewBooking) -> Result<Booking, StoreError> {
        Err(StoreError::UniqueViolation)
    }

    async fn get(&self, _id: &BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(None)
    }

    async fn taken_times(&self, _date: NaiveDate) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    async fn find_by_slot(&self, _date: NaiveDate, _time: &str) -> Result<Option<Booking>, StoreError> {
        Ok(None)
    }

    async fn delete(&self, _id: &BookingId) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn update_schedule(
        &self,
        _id: &BookingId,
        _date: NaiveDate,
        _time: &str,
        _notes: &str,
    ) -> Result<bool, StoreError> {
        Err(StoreError::UniqueViolation)
    }

    async fn upcoming(&self, _from: NaiveDate, _to: NaiveDate) -> Result<Vec<Booking>, StoreError> {
        Ok(Vec::new())
    }

    async fn mark_reminder_sent(
        &self,
        _id: &str,
        _kind: ReminderKind,
        _at: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Vec<Booking>, StoreError> {
        Ok(Vec::new())
    }

    async fn list(&self, _limit: i64) -> Result<Vec<Booking>, StoreError> {
        Ok(Vec::new())
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

pub fn noon() -> NaiveDateTime {
    today().and_hms_opt(12, 0, 0).unwrap()
}

pub fn build_state(
    store: Option<Box<dyn BookingStore>>,
    now: NaiveDateTime,
    fail_notifications: bool,
) -> (AppState, Sent) {
    let sent = Sent::default();
    let state = AppState {
        store,
        fallback: LocalFallbackStore::in_memory(),
        config: AppConfig::from_env(),
        notifier: Box::new(RecordingNotifier {
            sent: sent.clone(),
            fail: fail_notifications,
        }),
        clock: Box::new(FixedClock(now)),
    };
    (state, sent)
}

/// In-memory SQLite store, clock at noon on 2024-06-01.
pub fn test_state() -> (AppState, Sent) {
    test_state_at(noon())
}

pub fn test_state_at(now: NaiveDateTime) -> (AppState, Sent) {
    let store = SqliteBookingStore::open(":memory:").unwrap();
    build_state(Some(Box::new(store)), now, false)
}

pub fn test_state_without_store() -> (AppState, Sent) {
    build_state(None, noon(), false)
}

pub fn new_booking(date: NaiveDate, time: &str) -> NewBooking {
    NewBooking {
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        phone: "+15550001111".to_string(),
        business: "Ana's Bakery".to_string(),
        booking_date: date,
        booking_time: time.to_string(),
        notes: Some("Scheduled call".to_string()),
        created_at: noon(),
    }
}
