use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use crate::domain::models::booking::{Booking, PartyRole, PaymentStatus};
use crate::domain::models::text_enum;

text_enum! {
    pub enum RefundReason {
        NotPaid => "not_paid",
        OwnerCancelled => "owner_cancelled",
        BeforeCutoff => "before_cutoff",
        LateCancellation => "late_cancellation",
        PaymentAfterClose => "payment_after_close",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundDecision {
    pub refund: bool,
    pub reason: RefundReason,
}

/// Refund outcome of a cancellation. Used both for the preview shown before
/// cancelling and when the cancellation executes.
pub fn decide_refund(
    payment_status: PaymentStatus,
    start_time: DateTime<Utc>,
    cancelled_by: PartyRole,
    now: DateTime<Utc>,
    renter_cutoff: Duration,
) -> RefundDecision {
    if payment_status != PaymentStatus::Paid {
        return RefundDecision { refund: false, reason: RefundReason::NotPaid };
    }

    match cancelled_by {
        PartyRole::Owner => RefundDecision { refund: true, reason: RefundReason::OwnerCancelled },
        PartyRole::Renter if now <= start_time - renter_cutoff => {
            RefundDecision { refund: true, reason: RefundReason::BeforeCutoff }
        }
        PartyRole::Renter => RefundDecision { refund: false, reason: RefundReason::LateCancellation },
    }
}

pub fn decide_refund_for(booking: &Booking, cancelled_by: PartyRole, now: DateTime<Utc>, renter_cutoff: Duration) -> RefundDecision {
    decide_refund(booking.payment_status, booking.start_time, cancelled_by, now, renter_cutoff)
}
