use chrono::{DateTime, Utc};
use crate::error::AppError;

const SECONDS_PER_HOUR: i64 = 3600;
const HOURS_PER_DAY: i64 = 24;

/// Authoritative price of a window, in minor units.
///
/// Started hours are billed in full. With a day rate, every full 24 hours is
/// billed at the day rate and the remainder at the hourly rate, capped at one
/// day rate.
pub fn quote_price_cents(
    price_hour_cents: i64,
    price_day_cents: Option<i64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, AppError> {
    let span = end - start;
    if span <= chrono::Duration::zero() {
        return Err(AppError::validation("end_time", "end_time must be after start_time"));
    }
    // Sub-second remainders still start an hour.
    let seconds = span.num_seconds() + i64::from(span.subsec_nanos() > 0);
    let hours = (seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR;

    let total = match price_day_cents {
        Some(day) => {
            let full_days = hours / HOURS_PER_DAY;
            let rest = (hours % HOURS_PER_DAY) * price_hour_cents;
            full_days
                .checked_mul(day)
                .and_then(|d| d.checked_add(rest.min(day)))
        }
        None => hours.checked_mul(price_hour_cents),
    };

    total.ok_or_else(|| AppError::validation("end_time", "booking window is too long"))
}
