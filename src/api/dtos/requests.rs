use serde::Deserialize;
use crate::domain::models::booking::PartyRole;
use crate::domain::models::parking::ParkingType;
use crate::domain::services::availability::SlotDraft;

#[derive(Deserialize)]
pub struct CreateParkingRequest {
    pub title: String,
    pub description: Option<String>,
    pub address_line: String,
    pub postal_code: String,
    pub city: String,
    pub country: Option<String>,
    pub parking_type: Option<ParkingType>,
    #[serde(default)]
    pub is_covered: bool,
    #[serde(default)]
    pub has_ev_charging: bool,
    #[serde(default)]
    pub is_secure: bool,
    #[serde(default)]
    pub is_lit: bool,
    pub price_hour_cents: i64,
    pub price_day_cents: Option<i64>,
    pub currency: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateParkingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address_line: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub parking_type: Option<ParkingType>,
    pub is_covered: Option<bool>,
    pub has_ev_charging: Option<bool>,
    pub is_secure: Option<bool>,
    pub is_lit: Option<bool>,
    pub price_hour_cents: Option<i64>,
    pub price_day_cents: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ParkingSearchQuery {
    pub city: Option<String>,
}

#[derive(Deserialize)]
pub struct SlotRequest {
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl From<SlotRequest> for SlotDraft {
    fn from(req: SlotRequest) -> Self {
        SlotDraft {
            weekday: req.weekday,
            start_time: req.start_time,
            end_time: req.end_time,
            enabled: req.enabled,
        }
    }
}

#[derive(Deserialize)]
pub struct ReplaceAvailabilityRequest {
    pub slots: Vec<SlotRequest>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub parking_id: String,
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub parking_id: String,
    pub start_time: String,
    pub end_time: String,
    pub expected_price_cents: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmPaymentRequest {
    pub payment_reference: String,
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub role: Option<PartyRole>,
}

#[derive(Deserialize)]
pub struct RefundPreviewQuery {
    pub role: Option<PartyRole>,
}

/// Event posted by the payment processor.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentWebhookEvent {
    PaymentSucceeded {
        booking_id: String,
        payment_reference: String,
    },
    RefundSucceeded {
        booking_id: String,
        refund_id: Option<String>,
    },
    RefundFailed {
        booking_id: String,
        refund_id: Option<String>,
    },
    PayoutPaid {
        owner_id: String,
        amount_cents: i64,
        currency: String,
        payout_id: String,
        paid_at: Option<chrono::DateTime<chrono::Utc>>,
    },
}
