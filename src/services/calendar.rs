use chrono::Duration;

use crate::models::slots::{slot_start, SLOT_MINUTES};
use crate::models::Booking;

/// iCalendar invite for a booked call. `None` when the booking has no
/// usable slot.
pub fn generate_ics(booking: &Booking, organizer: &str) -> Option<String> {
    let (date, time) = booking.slot()?;
    let start = date.and_time(slot_start(time)?);
    let end = start + Duration::minutes(SLOT_MINUTES);

    let dtstart = start.format("%Y%m%dT%H%M%S").to_string();
    let dtend = end.format("%Y%m%dT%H%M%S").to_string();
    let dtstamp = booking.created_at.format("%Y%m%dT%H%M%S").to_string();
    let uid = format!("{}@leadbook", booking.id);

    let summary = format!("Website consultation with {organizer}");
    let description = format!("Call with {} about {}", escape_text(&booking.name), escape_text(&booking.business));

    Some(format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Leadbook//Booking//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        summary = escape_text(&summary),
    ))
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}
