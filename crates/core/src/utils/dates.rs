//! Local calendar date helpers.
//!
//! Completion entries are keyed by the calendar date at the user's wall
//! clock, not UTC, so a habit checked off at 23:30 lands on that day.

use chrono::{Local, NaiveDate};

/// Today's calendar date in the local timezone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a date as its ISO `YYYY-MM-DD` key.
pub fn local_iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
