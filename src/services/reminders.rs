use chrono::{Days, Duration, NaiveDateTime};
use serde::Serialize;

use crate::errors::BookingError;
use crate::models::slots::slot_start;
use crate::models::{Booking, ReminderKind, ReminderRequest};
use crate::services::notifications::display_date;
use crate::state::AppState;

/// How far ahead the sweep looks for bookings.
const SCAN_DAYS: u64 = 7;

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct SweepReport {
    pub processed: usize,
    pub reminders_1day: Vec<String>,
    pub reminders_starting_soon: Vec<String>,
    pub errors: Vec<String>,
}

impl SweepReport {
    pub fn reminders_sent(&self) -> usize {
        self.reminders_1day.len() + self.reminders_starting_soon.len()
    }

    fn record(&mut self, kind: ReminderKind, booking_id: &str) {
        let sent = match kind {
            ReminderKind::OneDay => &mut self.reminders_1day,
            ReminderKind::StartingSoon => &mut self.reminders_starting_soon,
        };
        sent.push(booking_id.to_string());
    }
}

impl ReminderKind {
    /// Whether a call starting `until` from now falls in this reminder's window.
    fn is_due(&self, until: Duration) -> bool {
        match self {
            ReminderKind::OneDay => until >= Duration::hours(23) && until <= Duration::hours(25),
            ReminderKind::StartingSoon => {
                until >= Duration::minutes(5) && until <= Duration::minutes(15)
            }
        }
    }
}

/// Sends each due reminder once, for bookings dated today through a week out.
///
/// Only a failure to list bookings aborts the sweep. Per-booking failures
/// end up in the report.
pub async fn run_sweep(state: &AppState, now: NaiveDateTime) -> Result<SweepReport, BookingError> {
    let today = now.date();
    let until = today.checked_add_days(Days::new(SCAN_DAYS)).unwrap_or(today);
    let bookings = state.store()?.upcoming(today, until).await?;

    let mut report = SweepReport {
        processed: bookings.len(),
        ..SweepReport::default()
    };

    for booking in &bookings {
        let Some((date, time)) = booking.slot() else {
            continue;
        };
        let Some(start) = slot_start(time).map(|t| date.and_time(t)) else {
            tracing::warn!(booking_id = %booking.id, time = %time, "unparseable booking time, skipping");
            report
                .errors
                .push(format!("Unparseable time {time:?} for booking {}", booking.id));
            continue;
        };
        let until_start = start - now;

        for kind in [ReminderKind::OneDay, ReminderKind::StartingSoon] {
            if !kind.is_due(until_start) {
                continue;
            }
            if let Some(sent_at) = booking.reminder_sent_at(kind) {
                tracing::debug!(booking_id = %booking.id, kind = kind.as_str(), %sent_at, "reminder already sent");
                continue;
            }
            send_reminder(state, booking, kind, now, &mut report).await;
        }
    }

    tracing::info!(
        processed = report.processed,
        sent = report.reminders_sent(),
        errors = report.errors.len(),
        "reminder sweep finished"
    );
    Ok(report)
}

async fn send_reminder(
    state: &AppState,
    booking: &Booking,
    kind: ReminderKind,
    now: NaiveDateTime,
    report: &mut SweepReport,
) {
    let Some((date, time)) = booking.slot() else {
        return;
    };

    let req = ReminderRequest {
        booking_id: booking.id.clone(),
        email: booking.email.clone(),
        name: booking.name.clone(),
        date: display_date(date),
        time: time.to_string(),
        business_name: Some(booking.business.clone()).filter(|b| !b.is_empty()),
    };

    let response = state.notifier.send_reminder(kind, &req).await;
    if !response.success {
        let error = response.error.unwrap_or_else(|| "unknown error".to_string());
        tracing::error!(booking_id = %booking.id, kind = kind.as_str(), error = %error, "failed to send reminder");
        report.errors.push(format!(
            "Failed to send {} reminder for {}: {error}",
            kind.as_str(),
            booking.id
        ));
        return;
    }

    // The reminder went out; a failed marker write only risks a duplicate.
    match state.store() {
        Ok(store) => match store.mark_reminder_sent(&booking.id, kind, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(booking_id = %booking.id, kind = kind.as_str(), "reminder marker was already set")
            }
            Err(e) => {
                tracing::error!(booking_id = %booking.id, kind = kind.as_str(), error = %e, "failed to mark reminder sent")
            }
        },
        Err(e) => tracing::error!(error = %e, "store gone before marking reminder"),
    }

    tracing::info!(booking_id = %booking.id, kind = kind.as_str(), "reminder sent");
    report.record(kind, &booking.id);
}
