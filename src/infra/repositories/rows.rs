use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::booking::Booking;
use crate::domain::models::parking::ParkingSnapshot;
use crate::domain::models::UnknownVariant;

/// Selects a booking together with the parking columns `BookingRow` picks up.
pub(crate) const BOOKING_WITH_PARKING: &str =
    "SELECT b.*, p.owner_id AS parking_owner_id, p.title AS parking_title, p.city AS parking_city, p.is_active AS parking_is_active
     FROM bookings b JOIN parkings p ON p.id = b.parking_id";

/// Booking as stored. Status columns are plain text here and parsed on the
/// way out so both backends decode the same way.
#[derive(Debug, FromRow)]
pub(crate) struct BookingRow {
    id: String,
    parking_id: String,
    renter_id: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    total_price_cents: i64,
    currency: String,
    status: String,
    payment_status: String,
    payment_reference: Option<String>,
    expires_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancelled_by: Option<String>,
    refund_status: Option<String>,
    refund_reason: Option<String>,
    refund_reference: Option<String>,
    created_at: DateTime<Utc>,
    #[sqlx(default)]
    parking_owner_id: Option<String>,
    #[sqlx(default)]
    parking_title: Option<String>,
    #[sqlx(default)]
    parking_city: Option<String>,
    #[sqlx(default)]
    parking_is_active: Option<bool>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = UnknownVariant;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let parking = match (row.parking_owner_id, row.parking_title, row.parking_city) {
            (Some(owner_id), Some(title), Some(city)) => Some(ParkingSnapshot {
                id: row.parking_id.clone(),
                owner_id,
                title,
                city,
                is_active: row.parking_is_active.unwrap_or(true),
            }),
            _ => None,
        };

        Ok(Booking {
            id: row.id,
            parking_id: row.parking_id,
            renter_id: row.renter_id,
            start_time: row.start_time,
            end_time: row.end_time,
            total_price_cents: row.total_price_cents,
            currency: row.currency,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            payment_reference: row.payment_reference,
            expires_at: row.expires_at,
            cancelled_at: row.cancelled_at,
            cancelled_by: row.cancelled_by.map(|r| r.parse()).transpose()?,
            refund_status: row.refund_status.map(|r| r.parse()).transpose()?,
            refund_reason: row.refund_reason,
            refund_reference: row.refund_reference,
            created_at: row.created_at,
            parking,
        })
    }
}

pub(crate) fn into_booking(row: BookingRow) -> Result<Booking, crate::error::AppError> {
    Ok(Booking::try_from(row)?)
}

pub(crate) fn into_bookings(rows: Vec<BookingRow>) -> Result<Vec<Booking>, crate::error::AppError> {
    rows.into_iter().map(into_booking).collect()
}
