use crate::errors::BookingError;
use crate::models::{Booking, BookingId, CancellationRequest};
use crate::services::notifications::display_date;
use crate::state::AppState;

/// Resolves a link's `id` parameter to a booking that can be cancelled or
/// rescheduled. `action` completes the "cannot be ..." message.
pub(crate) async fn load_booking(
    state: &AppState,
    raw_id: Option<&str>,
    action: &'static str,
) -> Result<(BookingId, Booking), BookingError> {
    let raw = raw_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BookingError::NotFound("No booking ID provided.".to_string()))?;

    let Some(id) = BookingId::parse(raw) else {
        tracing::info!(id = %raw, "rejecting booking id that is not from the store");
        return Err(BookingError::UnsupportedLegacyBooking);
    };

    let booking = state
        .store()?
        .get(&id)
        .await?
        .ok_or_else(|| BookingError::NotFound("Booking not found.".to_string()))?;

    if booking.slot().is_none() {
        tracing::warn!(booking_id = %id, "booking has no date or time");
        return Err(BookingError::Invalid(action));
    }

    Ok((id, booking))
}

/// A loaded booking awaiting the visitor's confirmation to cancel.
pub struct CancelFlow {
    id: BookingId,
    booking: Booking,
}

impl CancelFlow {
    pub async fn load(state: &AppState, raw_id: Option<&str>) -> Result<Self, BookingError> {
        let (id, booking) = load_booking(state, raw_id, "cancelled").await?;
        Ok(Self { id, booking })
    }

    pub fn booking(&self) -> &Booking {
        &self.booking
    }

    /// Deletes the booking, freeing its slot, and returns what was removed.
    pub async fn confirm(self, state: &AppState) -> Result<Booking, BookingError> {
        if !state.store()?.delete(&self.id).await? {
            return Err(BookingError::NotFound("Booking not found.".to_string()));
        }
        tracing::info!(booking_id = %self.id, "booking cancelled");

        if let Some((date, time)) = self.booking.slot() {
            let req = CancellationRequest {
                email: self.booking.email.clone(),
                name: self.booking.name.clone(),
                date: display_date(date),
                time: time.to_string(),
                business_name: Some(self.booking.business.clone()).filter(|b| !b.is_empty()),
            };
            let response = state.notifier.send_cancellation(&req).await;
            if !response.success {
                tracing::warn!(
                    booking_id = %self.id,
                    error = response.error.as_deref().unwrap_or("unknown"),
                    "cancellation notice not delivered"
                );
            }
        }

        Ok(self.booking)
    }
}
