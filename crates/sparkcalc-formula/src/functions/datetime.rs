use chrono::{DateTime, Utc};
use sparkcalc_core::{timestamp, ErrorKind, Value};

/// TODAY - Midnight (UTC) of the pass clock
pub fn today(now: DateTime<Utc>) -> Value {
    Value::DateTime(timestamp::from_datetime(now).floor())
}

/// NOW - The pass clock
pub fn now(now: DateTime<Utc>) -> Value {
    Value::DateTime(timestamp::from_datetime(now))
}

fn format_with(values: &[Value], format: fn(f64) -> Option<String>) -> Value {
    let days = match values.first().map(Value::to_number) {
        Some(Ok(days)) => days,
        Some(Err(e)) => return Value::Error(e),
        None => return Value::Error(ErrorKind::ArityMismatch),
    };

    match format(days) {
        Some(text) => Value::Text(text),
        None => Value::Error(ErrorKind::NumError),
    }
}

/// DATE - `YYYY-MM-DD` text of a timestamp
pub fn date(values: &[Value]) -> Value {
    format_with(values, timestamp::format_date)
}

/// TIME - `HH:MM:SS` text of a timestamp
pub fn time(values: &[Value]) -> Value {
    format_with(values, timestamp::format_time)
}
