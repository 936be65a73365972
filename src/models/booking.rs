use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::{Uuid, Variant};

/// Label stored when the visitor leaves the business name blank.
pub const DEFAULT_BUSINESS: &str = "Website Project";

/// Prefix of identifiers minted by the local fallback store.
pub const LOCAL_ID_PREFIX: &str = "local-";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub business: String,
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub reminder_1day_sent_at: Option<NaiveDateTime>,
    pub reminder_starting_soon_sent_at: Option<NaiveDateTime>,
    pub status: Option<String>,
}

impl Booking {
    /// The booked (date, time) pair. `None` for legacy rows missing either half.
    pub fn slot(&self) -> Option<(NaiveDate, &str)> {
        match (self.booking_date, self.booking_time.as_deref()) {
            (Some(date), Some(time)) if !time.is_empty() => Some((date, time)),
            _ => None,
        }
    }

    pub fn reminder_sent_at(&self, kind: ReminderKind) -> Option<NaiveDateTime> {
        match kind {
            ReminderKind::OneDay => self.reminder_1day_sent_at,
            ReminderKind::StartingSoon => self.reminder_starting_soon_sent_at,
        }
    }
}

/// A booking as submitted, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub business: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A booking that only exists in the local fallback store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalBooking {
    pub id: String,
    #[serde(flatten)]
    pub booking: NewBooking,
}

/// Where a submitted booking ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOrigin {
    Stored(Booking),
    /// Written while the store was unavailable. Invisible to other clients,
    /// and not supported by cancel or reschedule.
    LocalOnly(LocalBooking),
}

impl BookingOrigin {
    pub fn id(&self) -> &str {
        match self {
            BookingOrigin::Stored(b) => &b.id,
            BookingOrigin::LocalOnly(b) => &b.id,
        }
    }

    pub fn is_local_only(&self) -> bool {
        matches!(self, BookingOrigin::LocalOnly(_))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            BookingOrigin::Stored(b) => b.booking_date,
            BookingOrigin::LocalOnly(b) => Some(b.booking.booking_date),
        }
    }

    pub fn time(&self) -> Option<&str> {
        match self {
            BookingOrigin::Stored(b) => b.booking_time.as_deref(),
            BookingOrigin::LocalOnly(b) => Some(&b.booking.booking_time),
        }
    }
}

/// Identifier of a booking in the authoritative store.
///
/// Only the hyphenated UUID v4 shape is accepted, so fallback ids and
/// mangled link parameters are rejected before any store round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookingId(String);

impl BookingId {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 36 {
            return None;
        }
        let uuid = Uuid::try_parse(raw).ok()?;
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return None;
        }
        Some(Self(uuid.hyphenated().to_string()))
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    OneDay,
    StartingSoon,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::OneDay => "1day",
            ReminderKind::StartingSoon => "starting_soon",
        }
    }

    /// Column holding this kind's sent-at marker.
    pub fn column(&self) -> &'static str {
        match self {
            ReminderKind::OneDay => "reminder_1day_sent_at",
            ReminderKind::StartingSoon => "reminder_starting_soon_sent_at",
        }
    }
}
