use chrono::{Local, NaiveDate};

/// Format used by the backend for the date part of reading timestamps.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// The current calendar date in the device's local timezone.
///
/// This is the single source of truth for "today" when aggregating readings.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM-DD` rendering used to prefix-match reading timestamps.
pub fn iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}
