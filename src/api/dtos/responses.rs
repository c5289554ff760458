use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::models::booking::{Booking, DisplayStatus};
use crate::domain::services::refund_policy::RefundReason;

/// A booking as returned to clients, with the status derived at read time.
#[derive(Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub display_status: DisplayStatus,
}

impl BookingView {
    pub fn new(booking: Booking, now: DateTime<Utc>) -> Self {
        let display_status = booking.display_status(now);
        Self { booking, display_status }
    }

    pub fn list(bookings: Vec<Booking>, now: DateTime<Utc>) -> Vec<Self> {
        bookings.into_iter().map(|b| Self::new(b, now)).collect()
    }
}

/// What a client needs to resume checkout of a pending booking.
#[derive(Serialize)]
pub struct HoldView {
    pub booking_id: String,
    pub status: DisplayStatus,
    pub expires_at: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub total_price_cents: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl HoldView {
    pub fn new(booking: &Booking, now: DateTime<Utc>, redirect_url: Option<String>) -> Self {
        Self {
            booking_id: booking.id.clone(),
            status: booking.display_status(now),
            expires_at: booking.expires_at,
            remaining_seconds: booking.remaining_hold(now).num_seconds(),
            total_price_cents: booking.total_price_cents,
            currency: booking.currency.clone(),
            redirect_url,
        }
    }
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub parking_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub ok: bool,
    pub refunded: bool,
    pub reason: RefundReason,
    pub already_cancelled: bool,
    pub booking: BookingView,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
