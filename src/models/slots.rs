use chrono::NaiveTime;

/// Length of one appointment.
pub const SLOT_MINUTES: i64 = 30;

/// Every bookable time of day, identical for every date.
pub const SLOT_CATALOG: [&str; 18] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM",
    "12:00 PM", "12:30 PM", "01:00 PM", "01:30 PM", "02:00 PM", "02:30 PM",
    "03:00 PM", "03:30 PM", "04:00 PM", "04:30 PM", "05:00 PM", "05:30 PM",
];

pub fn is_catalog_slot(label: &str) -> bool {
    SLOT_CATALOG.contains(&label)
}

/// Wall-clock start of a slot label such as `"01:30 PM"`.
pub fn slot_start(label: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(label, "%I:%M %p").ok()
}
