//! DateTime values are stored as days since the Unix epoch (UTC); the
//! fractional part is the time of day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days since the epoch for a UTC instant
pub fn from_datetime(dt: DateTime<Utc>) -> f64 {
    dt.timestamp_millis() as f64 / (SECONDS_PER_DAY * 1000.0)
}

/// Days since the epoch for midnight UTC of the given date
pub fn from_date(date: NaiveDate) -> f64 {
    match date.and_hms_opt(0, 0, 0) {
        Some(midnight) => midnight.and_utc().timestamp() as f64 / SECONDS_PER_DAY,
        None => 0.0,
    }
}

/// Convert days since the epoch back to a calendar instant.
/// Returns `None` for non-finite input or dates chrono cannot represent.
pub fn to_datetime(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * SECONDS_PER_DAY * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
}

/// Parse a `YYYY-MM-DD` literal
pub fn parse_date(text: &str) -> Option<f64> {
    // chrono accepts unpadded fields; require the fixed ten-character layout
    if text.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(from_date)
}

/// `YYYY-MM-DD`
pub fn format_date(days: f64) -> Option<String> {
    to_datetime(days).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// `HH:MM:SS`
pub fn format_time(days: f64) -> Option<String> {
    to_datetime(days).map(|dt| dt.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch() {
        assert_eq!(parse_date("1970-01-01"), Some(0.0));
        assert_eq!(parse_date("1970-01-11"), Some(10.0));
        assert_eq!(format_date(0.0).as_deref(), Some("1970-01-01"));
        assert_eq!(format_time(0.0).as_deref(), Some("00:00:00"));
    }

    #[test]
    fn test_fractional_day_is_time() {
        let days = parse_date("2024-03-15").unwrap() + 0.75;
        assert_eq!(format_date(days).as_deref(), Some("2024-03-15"));
        assert_eq!(format_time(days).as_deref(), Some("18:00:00"));
    }

    #[test]
    fn test_rejects_loose_dates() {
        assert_eq!(parse_date("2024-3-5"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("hello"), None);
        assert_eq!(format_date(f64::NAN), None);
    }
}
