//! Domain models for the front-desk system.

mod appointment;
mod billing;
mod consultation;
mod patient;
mod queue;
mod user;
mod vitals;

pub use appointment::*;
pub use billing::*;
pub use consultation::*;
pub use patient::*;
pub use queue::*;
pub use user::*;
pub use vitals::*;

use chrono::{NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Current UTC time as a fixed-width RFC 3339 string.
///
/// Fixed width keeps lexical order equal to chronological order, which the
/// queue relies on for FIFO reads.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Today's calendar date in UTC, the same clock used for `created_at`.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse a wall-clock time given as `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
