use chrono::{DateTime, Utc};
use crate::error::AppError;

pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::validation("end_time", "end_time must be after start_time"));
    }
    Ok(())
}

pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::validation(field, "expected an RFC 3339 timestamp"))
}
