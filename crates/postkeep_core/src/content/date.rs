//! Display formatting for entry dates.

use chrono::NaiveDate;

/// Formats a creation date as `"<dd> <MON>"`, e.g. `"05 JAN"`.
pub fn humanize_date(date: NaiveDate) -> String {
    date.format("%d %b").to_string().to_uppercase()
}
