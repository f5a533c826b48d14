//! Due-date helpers for the calendar control round-trip.
//!
//! The date input widget speaks `YYYY-MM-DD` strings; cards store epoch
//! milliseconds. Both directions degrade to "no value" (`""` / `None`)
//! rather than erroring on malformed input.

use chrono::{DateTime, NaiveDate};

/// Format epoch milliseconds as `YYYY-MM-DD`, or `""` when absent/invalid.
pub fn format_date_input(millis: Option<i64>) -> String {
    let Some(ms) = millis else {
        return String::new();
    };
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

/// Parse a `YYYY-MM-DD` string from the date input.
///
/// Rejects empty input, wrong component count, and any component that is
/// non-numeric or zero. Returns `None` rather than erroring.
pub fn parse_date_input(input: &str) -> Option<NaiveDate> {
    if input.is_empty() {
        return None;
    }
    let mut parts = input.split('-');
    let year = numeric_component(parts.next()?)?;
    let month = numeric_component(parts.next()?)?;
    let day = numeric_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
}

/// Parse one date component; zero and non-numeric both count as invalid.
fn numeric_component(s: &str) -> Option<u64> {
    match s.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n),
    }
}

/// Midnight UTC of a parsed date, as epoch milliseconds.
///
/// Companion to [`parse_date_input`] for writing back to a card's `due_at`.
pub fn date_to_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}
