use crate::domain::models::{
    availability::AvailabilitySlot, booking::{Booking, PartyRole, PaymentStatus, RefundStatus},
    parking::Parking, payout::Payout,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ParkingRepository: Send + Sync {
    async fn create(&self, parking: &Parking) -> Result<Parking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Parking>, AppError>;
    async fn update(&self, parking: &Parking) -> Result<Parking, AppError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Parking>, AppError>;
    async fn search_active(&self, city: Option<&str>) -> Result<Vec<Parking>, AppError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Deletes every slot of the parking and inserts `slots` in one transaction.
    async fn replace_for_parking(&self, parking_id: &str, slots: &[AvailabilitySlot]) -> Result<(), AppError>;
    async fn list_by_parking(&self, parking_id: &str) -> Result<Vec<AvailabilitySlot>, AppError>;
}

/// Cancellation fields written together with the status change.
pub struct CancellationRecord<'a> {
    pub role: PartyRole,
    pub at: DateTime<Utc>,
    /// The update applies only while the payment is still in this state.
    pub expected_payment_status: PaymentStatus,
    pub refund_reason: &'a str,
    pub payment_status: PaymentStatus,
    pub refund_status: Option<RefundStatus>,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking unless a booking blocking the window exists at
    /// `now`. Check and insert are one atomic unit; an overlap is reported as
    /// `AppError::Conflict`.
    async fn create_if_available(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn count_overlap(&self, parking_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Result<i64, AppError>;
    async fn list_by_renter(&self, renter_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Paid, non-cancelled bookings on parkings of `owner_id`.
    async fn list_earning_bookings(&self, owner_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Moves a pending booking to confirmed/paid. Returns `None` when the
    /// booking is not pending or its window was taken after the hold lapsed.
    async fn confirm_payment(&self, id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError>;
    /// Attaches a payment that arrived for a closed booking and marks it for
    /// refund. Applies to unpaid bookings that are cancelled, expired, or
    /// pending with a lapsed hold (those become expired). Returns `None` when
    /// none of that holds.
    async fn record_late_payment(&self, id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError>;
    /// Expires one pending booking if its hold has lapsed at `now`.
    async fn expire_pending(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError>;
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
    /// Cancels an active booking. Returns `None` if it was no longer active or
    /// its payment moved away from `record.expected_payment_status`.
    async fn cancel(&self, id: &str, record: CancellationRecord<'_>) -> Result<Option<Booking>, AppError>;
    /// Records a refund transition for a booking whose payment is refunding.
    async fn update_refund_state(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        refund_status: RefundStatus,
        refund_reference: Option<&str>,
    ) -> Result<Option<Booking>, AppError>;
    /// Marks a failed refund as requested again. Returns `None` if the refund
    /// is not in the failed state.
    async fn claim_refund_retry(&self, id: &str) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait PayoutRepository: Send + Sync {
    /// Records a payout. A repeated `external_reference` is ignored.
    async fn record(&self, payout: &Payout) -> Result<(), AppError>;
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Payout>, AppError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a checkout session and returns the URL the renter is redirected to.
    async fn create_checkout(&self, booking_id: &str, amount_cents: i64, currency: &str) -> Result<String, AppError>;
    /// Refunds a captured payment and returns the processor's refund id.
    async fn issue_refund(&self, payment_reference: &str, amount_cents: i64, currency: &str) -> Result<String, AppError>;
}
