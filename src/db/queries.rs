use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Booking, NewBooking, ReminderKind};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, name, email, phone, business, booking_date, booking_time, notes, \
     created_at, reminder_1day_sent_at, reminder_starting_soon_sent_at, status";

// ── Bookings ──

pub fn insert_booking(conn: &Connection, id: &str, booking: &NewBooking) -> anyhow::Result<()> {
    let booking_date = booking.booking_date.format(DATE_FORMAT).to_string();
    let created_at = booking.created_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO bookings (id, name, email, phone, business, booking_date, booking_time, notes, created_at, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'new')",
        params![
            id,
            booking.name,
            booking.email,
            booking.phone,
            booking.business,
            booking_date,
            booking.booking_time,
            booking.notes,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    let booking = conn
        .query_row(&sql, params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;

    booking.transpose()
}

pub fn get_taken_times(conn: &Connection, date: &NaiveDate) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT booking_time FROM bookings
         WHERE booking_date = ?1 AND booking_time IS NOT NULL ORDER BY booking_time ASC",
    )?;

    let rows = stmt.query_map(params![date.format(DATE_FORMAT).to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut times = vec![];
    for row in rows {
        times.push(row?);
    }
    Ok(times)
}

pub fn find_booking_by_slot(
    conn: &Connection,
    date: &NaiveDate,
    time: &str,
) -> anyhow::Result<Option<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_date = ?1 AND booking_time = ?2 LIMIT 1"
    );
    let booking = conn
        .query_row(
            &sql,
            params![date.format(DATE_FORMAT).to_string(), time],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    booking.transpose()
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn update_booking_schedule(
    conn: &Connection,
    id: &str,
    date: &NaiveDate,
    time: &str,
    notes: &str,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings
         SET booking_date = ?1, booking_time = ?2, notes = ?3,
             reminder_1day_sent_at = NULL, reminder_starting_soon_sent_at = NULL
         WHERE id = ?4",
        params![date.format(DATE_FORMAT).to_string(), time, notes, id],
    )?;
    Ok(count > 0)
}

/// Bookings with both date and time set, dated within `[from, to]`.
pub fn get_bookings_in_range(
    conn: &Connection,
    from: &NaiveDate,
    to: &NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE booking_date IS NOT NULL AND booking_time IS NOT NULL
           AND booking_date >= ?1 AND booking_date <= ?2
         ORDER BY booking_date ASC, booking_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(
        params![from.format(DATE_FORMAT).to_string(), to.format(DATE_FORMAT).to_string()],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Sets a reminder marker unless another sweep already set it.
/// Returns `false` when the marker was already present or the row is gone.
pub fn mark_reminder_sent(
    conn: &Connection,
    id: &str,
    kind: ReminderKind,
    at: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let column = kind.column();
    let sql = format!("UPDATE bookings SET {column} = ?1 WHERE id = ?2 AND {column} IS NULL");
    let count = conn.execute(&sql, params![at.format(TIMESTAMP_FORMAT).to_string(), id])?;
    Ok(count > 0)
}

pub fn get_bookings_for_email(conn: &Connection, email: &str) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE email = ?1 ORDER BY booking_date ASC, booking_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params![email], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let booking_date: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(8)?;
    let reminder_1day: Option<String> = row.get(9)?;
    let reminder_soon: Option<String> = row.get(10)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        business: row.get(4)?,
        booking_date: booking_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok()),
        booking_time: row.get(6)?,
        notes: row.get(7)?,
        created_at,
        reminder_1day_sent_at: reminder_1day.as_deref().and_then(parse_timestamp),
        reminder_starting_soon_sent_at: reminder_soon.as_deref().and_then(parse_timestamp),
        status: row.get(11)?,
    })
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
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
    fn test_insert_and_fetch() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();

        let booking = get_booking_by_id(&conn, "b-1").unwrap().unwrap();
        assert_eq!(booking.booking_date, Some(d("2024-06-03")));
        assert_eq!(booking.booking_time.as_deref(), Some("10:00 AM"));
        assert_eq!(booking.status.as_deref(), Some("new"));
        assert!(booking.reminder_1day_sent_at.is_none());

        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_slot_unique_index() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();
        let err = insert_booking(&conn, "b-2", &new_booking("2024-06-03", "10:00 AM"));
        assert!(err.is_err());

        // Same time on another day is fine
        insert_booking(&conn, "b-3", &new_booking("2024-06-04", "10:00 AM")).unwrap();
    }

    #[test]
    fn test_taken_times_and_delete() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();
        insert_booking(&conn, "b-2", &new_booking("2024-06-03", "02:00 PM")).unwrap();

        let taken = get_taken_times(&conn, &d("2024-06-03")).unwrap();
        assert_eq!(taken.len(), 2);
        assert!(taken.contains(&"10:00 AM".to_string()));

        assert!(delete_booking(&conn, "b-1").unwrap());
        assert!(!delete_booking(&conn, "b-1").unwrap());
        assert_eq!(get_taken_times(&conn, &d("2024-06-03")).unwrap(), vec!["02:00 PM"]);
    }

    #[test]
    fn test_update_schedule() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();

        assert!(update_booking_schedule(&conn, "b-1", &d("2024-06-04"), "11:00 AM", "moved").unwrap());
        let found = find_booking_by_slot(&conn, &d("2024-06-04"), "11:00 AM").unwrap().unwrap();
        assert_eq!(found.id, "b-1");
        assert_eq!(found.notes.as_deref(), Some("moved"));
        assert!(find_booking_by_slot(&conn, &d("2024-06-03"), "10:00 AM").unwrap().is_none());
    }

    #[test]
    fn test_update_schedule_resets_reminders() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();
        let at = d("2024-06-02").and_hms_opt(10, 0, 0).unwrap();
        mark_reminder_sent(&conn, "b-1", ReminderKind::OneDay, &at).unwrap();
        mark_reminder_sent(&conn, "b-1", ReminderKind::StartingSoon, &at).unwrap();

        update_booking_schedule(&conn, "b-1", &d("2024-06-05"), "11:00 AM", "moved").unwrap();
        let booking = get_booking_by_id(&conn, "b-1").unwrap().unwrap();
        assert!(booking.reminder_1day_sent_at.is_none());
        assert!(booking.reminder_starting_soon_sent_at.is_none());
    }

    #[test]
    fn test_range_skips_legacy_rows() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();
        insert_booking(&conn, "b-2", &new_booking("2024-06-20", "10:00 AM")).unwrap();
        conn.execute(
            "INSERT INTO bookings (id, name, email) VALUES ('legacy', 'Old', 'old@example.com')",
            [],
        )
        .unwrap();

        let bookings = get_bookings_in_range(&conn, &d("2024-06-01"), &d("2024-06-08")).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, "b-1");
    }

    #[test]
    fn test_mark_reminder_sent_once() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();
        let at = d("2024-06-02").and_hms_opt(10, 0, 0).unwrap();

        assert!(mark_reminder_sent(&conn, "b-1", ReminderKind::OneDay, &at).unwrap());
        assert!(!mark_reminder_sent(&conn, "b-1", ReminderKind::OneDay, &at).unwrap());

        let booking = get_booking_by_id(&conn, "b-1").unwrap().unwrap();
        assert_eq!(booking.reminder_1day_sent_at, Some(at));
        assert!(booking.reminder_starting_soon_sent_at.is_none());
    }

    #[test]
    fn test_bookings_for_email() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, "b-1", &new_booking("2024-06-03", "10:00 AM")).unwrap();
        let mut other = new_booking("2024-06-03", "11:00 AM");
        other.email = "bo@example.com".to_string();
        insert_booking(&conn, "b-2", &other).unwrap();

        let bookings = get_bookings_for_email(&conn, "bo@example.com").unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].id, "b-2");
        assert_eq!(get_all_bookings(&conn, 10).unwrap().len(), 2);
    }
}
