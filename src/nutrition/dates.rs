//! Canonical `YYYY-MM-DD` day keys.
//!
//! Balance requests and meal timestamps both go through [`normalize`], so a
//! meal logged at `2024-02-01T23:50:00-03:00` lands on `2024-02-01` no matter
//! what offset it carries.

use lazy_static::lazy_static;
use regex::Regex;
use time::{
    format_description::{well_known::Rfc2822, well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

use crate::error::AppError;

lazy_static! {
    static ref DAY_PREFIX_RE: Regex = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap();
}

const NAIVE_DATE_TIME_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
    format_description!("[year]/[month]/[day] [hour]:[minute]"),
];

const NAIVE_DATE_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[year]/[month]/[day]"),
    format_description!("[month]/[day]/[year]"),
];

pub fn invalid_date() -> AppError {
    AppError::validation("invalid date format")
}

/// Turns an optional date or date-time string into a day key.
/// Absent or blank input means today (UTC).
pub fn normalize(input: Option<&str>) -> Result<String, AppError> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(day_key(OffsetDateTime::now_utc().date())),
        Some(s) => parse_day_key(s).ok_or_else(invalid_date),
    }
}

/// Day key for an epoch-milliseconds timestamp.
pub fn from_epoch_millis(millis: i64) -> Option<String> {
    let nanos = i128::from(millis) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .map(|dt| day_key(dt.date()))
}

pub fn day_key(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn parse_day_key(s: &str) -> Option<String> {
    if DAY_PREFIX_RE.is_match(s) {
        if let Some(prefix) = s.get(..10) {
            return Some(prefix.to_string());
        }
    }
    parse_instant(s).map(|dt| day_key(dt.to_offset(UtcOffset::UTC).date()))
}

fn parse_instant(s: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return Some(dt);
    }
    for fmt in NAIVE_DATE_TIME_FORMATS {
        if let Ok(dt) = PrimitiveDateTime::parse(s, fmt) {
            return Some(dt.assume_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = Date::parse(s, fmt) {
            return Some(d.midnight().assume_utc());
        }
    }
    None
}
