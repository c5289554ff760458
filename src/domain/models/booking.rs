use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use super::parking::ParkingSnapshot;
use super::text_enum;

text_enum! {
    pub enum BookingStatus {
        PendingPayment => "pending_payment",
        Confirmed => "confirmed",
        CancelledByRenter => "cancelled_by_renter",
        CancelledByOwner => "cancelled_by_owner",
        Expired => "expired",
    }
}

text_enum! {
    pub enum PaymentStatus {
        Unpaid => "unpaid",
        Paid => "paid",
        Refunding => "refunding",
        Refunded => "refunded",
    }
}

text_enum! {
    /// Which side of a booking is acting on it.
    pub enum PartyRole {
        Renter => "renter",
        Owner => "owner",
    }
}

text_enum! {
    pub enum RefundStatus {
        Requested => "requested",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

text_enum! {
    /// Status as shown to clients. `Completed` is never stored.
    pub enum DisplayStatus {
        PendingPayment => "pending_payment",
        Confirmed => "confirmed",
        Completed => "completed",
        CancelledByRenter => "cancelled_by_renter",
        CancelledByOwner => "cancelled_by_owner",
        Expired => "expired",
    }
}

impl BookingStatus {
    pub fn cancelled_by(role: PartyRole) -> Self {
        match role {
            PartyRole::Renter => Self::CancelledByRenter,
            PartyRole::Owner => Self::CancelledByOwner,
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::CancelledByRenter | Self::CancelledByOwner)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    pub id: String,
    pub parking_id: String,
    pub renter_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price_cents: i64,
    pub currency: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<PartyRole>,
    pub refund_status: Option<RefundStatus>,
    pub refund_reason: Option<String>,
    pub refund_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking: Option<ParkingSnapshot>,
}

pub struct NewBookingParams {
    pub parking_id: String,
    pub renter_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_price_cents: i64,
    pub currency: String,
    pub hold_ttl: Duration,
    pub now: DateTime<Utc>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parking_id: params.parking_id,
            renter_id: params.renter_id,
            start_time: params.start,
            end_time: params.end,
            total_price_cents: params.total_price_cents,
            currency: params.currency,
            status: BookingStatus::PendingPayment,
            payment_status: PaymentStatus::Unpaid,
            payment_reference: None,
            expires_at: params.now + params.hold_ttl,
            cancelled_at: None,
            cancelled_by: None,
            refund_status: None,
            refund_reason: None,
            refund_reference: None,
            created_at: params.now,
            parking: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// A pending booking whose payment hold ran out.
    pub fn hold_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::PendingPayment && self.expires_at <= now
    }

    /// Whether this booking keeps its `[start_time, end_time)` window taken.
    pub fn blocks_window(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            BookingStatus::Confirmed => true,
            BookingStatus::PendingPayment => self.expires_at > now,
            _ => false,
        }
    }

    pub fn remaining_hold(&self, now: DateTime<Utc>) -> Duration {
        if self.status != BookingStatus::PendingPayment {
            return Duration::zero();
        }
        (self.expires_at - now).max(Duration::zero())
    }

    pub fn display_status(&self, now: DateTime<Utc>) -> DisplayStatus {
        match self.status {
            BookingStatus::PendingPayment if self.hold_expired(now) => DisplayStatus::Expired,
            BookingStatus::PendingPayment => DisplayStatus::PendingPayment,
            BookingStatus::Confirmed if self.end_time <= now => DisplayStatus::Completed,
            BookingStatus::Confirmed => DisplayStatus::Confirmed,
            BookingStatus::CancelledByRenter => DisplayStatus::CancelledByRenter,
            BookingStatus::CancelledByOwner => DisplayStatus::CancelledByOwner,
            BookingStatus::Expired => DisplayStatus::Expired,
        }
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.parking.as_ref().map(|p| p.owner_id.as_str())
    }

    /// Resolves the role `user_id` plays on this booking, if any.
    pub fn role_of(&self, user_id: &str) -> Option<PartyRole> {
        if self.renter_id == user_id {
            Some(PartyRole::Renter)
        } else if self.owner_id() == Some(user_id) {
            Some(PartyRole::Owner)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(now: DateTime<Utc>) -> Booking {
        Booking::new(NewBookingParams {
            parking_id: "p1".into(),
            renter_id: "r1".into(),
            start: now + Duration::hours(2),
            end: now + Duration::hours(4),
            total_price_cents: 1000,
            currency: "CHF".into(),
            hold_ttl: Duration::minutes(10),
            now,
        })
    }

    #[test]
    fn pending_hold_blocks_until_expiry() {
        let now = Utc::now();
        let booking = pending(now);
        assert!(booking.blocks_window(now + Duration::minutes(9)));
        assert!(!booking.blocks_window(now + Duration::minutes(10)));
        assert_eq!(booking.remaining_hold(now + Duration::minutes(4)), Duration::minutes(6));
        assert_eq!(booking.remaining_hold(now + Duration::hours(1)), Duration::zero());
    }

    #[test]
    fn confirmed_booking_reads_as_completed_after_end() {
        let now = Utc::now();
        let mut booking = pending(now);
        booking.status = BookingStatus::Confirmed;
        assert_eq!(booking.display_status(now), DisplayStatus::Confirmed);
        assert_eq!(booking.display_status(now + Duration::hours(4)), DisplayStatus::Completed);
        assert!(booking.blocks_window(now + Duration::days(30)));
    }

    #[test]
    fn cancelled_booking_never_blocks() {
        let now = Utc::now();
        let mut booking = pending(now);
        booking.status = BookingStatus::CancelledByOwner;
        assert!(!booking.blocks_window(now));
        assert!(booking.is_cancelled());
    }

    #[test]
    fn role_resolution_uses_parking_owner() {
        let now = Utc::now();
        let mut booking = pending(now);
        booking.parking = Some(ParkingSnapshot {
            id: "p1".into(),
            owner_id: "o1".into(),
            title: "Garage".into(),
            city: "Zurich".into(),
            is_active: true,
        });
        assert_eq!(booking.role_of("r1"), Some(PartyRole::Renter));
        assert_eq!(booking.role_of("o1"), Some(PartyRole::Owner));
        assert_eq!(booking.role_of("x"), None);
    }

    #[test]
    fn status_text_round_trips_through_parse() {
        assert_eq!("cancelled_by_owner".parse::<BookingStatus>().unwrap(), BookingStatus::CancelledByOwner);
        assert!("cancelled".parse::<BookingStatus>().is_err());
    }
}
