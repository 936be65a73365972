use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

/// Number of bookable days, starting tomorrow.
pub const WINDOW_DAYS: u64 = 4;

/// The rolling range of bookable dates: tomorrow through tomorrow + 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    first: NaiveDate,
    last: NaiveDate,
}

impl AvailabilityWindow {
    pub fn starting_from(today: NaiveDate) -> Self {
        let first = today.succ_opt().unwrap_or(today);
        let last = first
            .checked_add_days(Days::new(WINDOW_DAYS - 1))
            .unwrap_or(first);
        Self { first, last }
    }

    pub fn first(&self) -> NaiveDate {
        self.first
    }

    pub fn last(&self) -> NaiveDate {
        self.last
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.first, self.last)
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.first
            .iter_days()
            .take_while(|d| *d <= self.last)
            .collect()
    }

    pub fn overlaps_month(&self, year: i32, month: u32) -> bool {
        match month_bounds(year, month) {
            Some((start, end)) => start <= self.last && end >= self.first,
            None => false,
        }
    }
}

pub fn is_date_available(date: NaiveDate, today: NaiveDate) -> bool {
    AvailabilityWindow::starting_from(today).contains(date)
}

/// Moves `selected` by `delta` months and clamps it into the window.
///
/// Returns `None` when the target month has no bookable day, in which case
/// the caller keeps its current selection.
pub fn navigate_month(selected: NaiveDate, delta: i32, today: NaiveDate) -> Option<NaiveDate> {
    let moved = if delta >= 0 {
        selected.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        selected.checked_sub_months(Months::new(delta.unsigned_abs()))
    }?;

    let window = AvailabilityWindow::starting_from(today);
    if !window.overlaps_month(moved.year(), moved.month()) {
        return None;
    }
    Some(window.clamp(moved))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub date: NaiveDate,
    pub available: bool,
}

/// Sunday-first month grid. Leading `None` cells pad the first week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<Option<DayCell>>,
}

pub fn month_grid(year: i32, month: u32, today: NaiveDate) -> Option<MonthGrid> {
    let (start, end) = month_bounds(year, month)?;
    let window = AvailabilityWindow::starting_from(today);

    let offset = start.weekday().num_days_from_sunday() as usize;
    let mut cells: Vec<Option<DayCell>> = vec![None; offset];
    cells.extend(
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| {
                Some(DayCell {
                    day: date.day(),
                    date,
                    available: window.contains(date),
                })
            }),
    );

    Some(MonthGrid { year, month, cells })
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((start, end))
}
