use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use crate::config::BookingPolicy;
use crate::domain::models::booking::{
    Booking, BookingStatus, NewBookingParams, PartyRole, PaymentStatus, RefundStatus,
};
use crate::domain::models::parking::ParkingSnapshot;
use crate::domain::ports::{BookingRepository, CancellationRecord, ParkingRepository, PaymentGateway};
use crate::domain::services::conflict::validate_window;
use crate::domain::services::pricing::quote_price_cents;
use crate::domain::services::refund_policy::{decide_refund_for, RefundDecision};
use crate::error::AppError;

const CANCEL_ATTEMPTS: usize = 3;

pub struct CreateBookingCommand {
    pub parking_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub expected_price_cents: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub decision: RefundDecision,
    pub refund_initiated: bool,
    pub already_cancelled: bool,
}

pub struct BookingService {
    booking_repo: Arc<dyn BookingRepository>,
    parking_repo: Arc<dyn ParkingRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        parking_repo: Arc<dyn ParkingRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        policy: BookingPolicy,
    ) -> Self {
        Self { booking_repo, parking_repo, payment_gateway, policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    async fn load(&self, booking_id: &str) -> Result<Booking, AppError> {
        self.booking_repo.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }

    /// Loads a booking and checks that `actor_id` is the renter or the owner.
    pub async fn load_for_party(&self, actor_id: &str, booking_id: &str) -> Result<(Booking, PartyRole), AppError> {
        let booking = self.load(booking_id).await?;
        let role = booking.role_of(actor_id)
            .ok_or(AppError::Forbidden("Not a party to this booking".into()))?;
        Ok((booking, role))
    }

    /// Advisory read. `create_booking` re-checks atomically.
    pub async fn is_available(&self, parking_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Result<bool, AppError> {
        validate_window(start, end)?;
        self.parking_repo.find_by_id(parking_id).await?
            .ok_or(AppError::NotFound("Parking not found".into()))?;

        let overlapping = self.booking_repo.count_overlap(parking_id, start, end, now).await?;
        Ok(overlapping == 0)
    }

    pub async fn create_booking(&self, renter_id: &str, cmd: CreateBookingCommand, now: DateTime<Utc>) -> Result<Booking, AppError> {
        validate_window(cmd.start, cmd.end)?;
        if cmd.start < now {
            return Err(AppError::validation("start_time", "Cannot book in the past"));
        }

        let parking = self.parking_repo.find_by_id(&cmd.parking_id).await?
            .filter(|p| p.is_active)
            .ok_or(AppError::NotFound("Parking not found".into()))?;

        if cmd.currency.as_deref().is_some_and(|c| !c.eq_ignore_ascii_case(&parking.currency)) {
            return Err(AppError::validation("currency", format!("Parking is priced in {}", parking.currency)));
        }

        let total_price_cents = quote_price_cents(parking.price_hour_cents, parking.price_day_cents, cmd.start, cmd.end)?;
        if let Some(expected) = cmd.expected_price_cents.filter(|e| *e != total_price_cents) {
            warn!(
                "Client price estimate {} differs from quoted {} for parking {}",
                expected, total_price_cents, parking.id
            );
        }

        let booking = Booking::new(NewBookingParams {
            parking_id: parking.id.clone(),
            renter_id: renter_id.to_string(),
            start: cmd.start,
            end: cmd.end,
            total_price_cents,
            currency: parking.currency.clone(),
            hold_ttl: self.policy.pending_payment_ttl,
            now,
        });

        let mut created = match self.booking_repo.create_if_available(&booking, now).await {
            Ok(created) => created,
            Err(AppError::Conflict(msg)) => {
                warn!("Booking rejected for parking {} [{} - {}): {}", parking.id, cmd.start, cmd.end, msg);
                return Err(AppError::Conflict(msg));
            }
            Err(e) => return Err(e),
        };
        created.parking = Some(ParkingSnapshot::from(&parking));

        info!("Booking {} created for parking {} (pending payment until {})", created.id, parking.id, created.expires_at);
        Ok(created)
    }

    /// Flips a pending booking to confirmed/paid. Repeated deliveries for a
    /// confirmed booking succeed without side effects. A payment that lands on
    /// a booking already closed (cancelled, expired, or whose lapsed window
    /// was taken) is recorded and refunded; the booking stays closed.
    pub async fn confirm_payment(&self, booking_id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let booking = self.load(booking_id).await?;

        if booking.status == BookingStatus::Confirmed {
            info!("Duplicate payment confirmation ignored for booking {}", booking.id);
            return Ok(booking);
        }
        if booking.payment_reference.as_deref() == Some(payment_reference) {
            info!("Payment {} already recorded for booking {}", payment_reference, booking.id);
            return Ok(booking);
        }

        if booking.status == BookingStatus::PendingPayment {
            if let Some(confirmed) = self.booking_repo.confirm_payment(booking_id, payment_reference, now).await? {
                info!("Payment confirmed for booking {} (ref {})", confirmed.id, payment_reference);
                return Ok(confirmed);
            }

            let current = self.load(booking_id).await?;
            if current.status == BookingStatus::Confirmed {
                return Ok(current);
            }
        }

        self.refund_late_payment(booking_id, payment_reference, now).await
    }

    async fn refund_late_payment(&self, booking_id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Booking, AppError> {
        if let Some(closed) = self.booking_repo.record_late_payment(booking_id, payment_reference, now).await? {
            warn!("Payment {} arrived for closed booking {} ({}), refunding", payment_reference, closed.id, closed.status);
            return Ok(self.issue_refund(closed).await);
        }

        let current = self.load(booking_id).await?;
        if current.status == BookingStatus::Confirmed || current.payment_reference.as_deref() == Some(payment_reference) {
            return Ok(current);
        }

        error!(
            "Payment {} for booking {} could not be applied (status {}, payment {})",
            payment_reference, booking_id, current.status, current.payment_status
        );
        Err(AppError::Conflict(format!("Booking is {} and cannot take this payment", current.status)))
    }

    /// Releases a pending booking whose hold has lapsed. Returns whether the
    /// booking was expired by this call.
    pub async fn expire_pending(&self, booking_id: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let expired = self.booking_repo.expire_pending(booking_id, now).await?;
        if expired {
            info!("Pending booking {} expired", booking_id);
        }
        Ok(expired)
    }

    /// On-access form of the expiry sweep for a booking about to be shown.
    pub async fn settle_expiry(&self, mut booking: Booking, now: DateTime<Utc>) -> Result<Booking, AppError> {
        if booking.hold_expired(now) && self.expire_pending(&booking.id, now).await? {
            booking.status = BookingStatus::Expired;
        }
        Ok(booking)
    }

    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.booking_repo.expire_stale(now).await
    }

    /// Returns the renter's pending booking with an open hold.
    pub async fn payment_hold(&self, renter_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.load(booking_id).await?;
        if booking.renter_id != renter_id {
            return Err(AppError::Forbidden("Only the renter can pay for this booking".into()));
        }
        Ok(booking)
    }

    /// Opens (or re-opens) checkout for the same pending booking.
    pub async fn start_checkout(&self, renter_id: &str, booking_id: &str, now: DateTime<Utc>) -> Result<(Booking, String), AppError> {
        let booking = self.payment_hold(renter_id, booking_id).await?;

        if booking.status != BookingStatus::PendingPayment {
            return Err(AppError::Conflict(format!("Booking is {} and needs no payment", booking.status)));
        }
        if booking.hold_expired(now) {
            return Err(AppError::Conflict("Payment hold has expired, please book again".into()));
        }

        let redirect_url = self.payment_gateway
            .create_checkout(&booking.id, booking.total_price_cents, &booking.currency)
            .await?;

        info!("Checkout opened for booking {}", booking.id);
        Ok((booking, redirect_url))
    }

    pub async fn preview_refund(&self, actor_id: &str, booking_id: &str, role: Option<PartyRole>, now: DateTime<Utc>) -> Result<RefundDecision, AppError> {
        let (booking, actual_role) = self.load_for_party(actor_id, booking_id).await?;
        let role = role.unwrap_or(actual_role);
        authorize_role(&booking, actor_id, role)?;
        Ok(decide_refund_for(&booking, role, now, self.policy.renter_refund_cutoff))
    }

    pub async fn cancel_booking(&self, actor_id: &str, booking_id: &str, role: PartyRole, now: DateTime<Utc>) -> Result<CancellationOutcome, AppError> {
        for _ in 0..CANCEL_ATTEMPTS {
            let booking = self.load(booking_id).await?;
            authorize_role(&booking, actor_id, role)?;

            let decision = decide_refund_for(&booking, role, now, self.policy.renter_refund_cutoff);

            if booking.is_cancelled() {
                info!("Booking {} already cancelled, nothing to do", booking.id);
                return Ok(CancellationOutcome { booking, decision, refund_initiated: false, already_cancelled: true });
            }
            if booking.status == BookingStatus::Expired {
                return Err(AppError::Conflict("Booking has expired".into()));
            }

            let record = CancellationRecord {
                role,
                at: now,
                expected_payment_status: booking.payment_status,
                refund_reason: decision.reason.as_str(),
                payment_status: if decision.refund { PaymentStatus::Refunding } else { booking.payment_status },
                refund_status: decision.refund.then_some(RefundStatus::Requested),
            };

            let Some(cancelled) = self.booking_repo.cancel(booking_id, record).await? else {
                // Status or payment changed underneath us; re-read and decide again.
                continue;
            };

            info!("Booking {} cancelled by {} ({})", cancelled.id, role, decision.reason);

            if !decision.refund {
                return Ok(CancellationOutcome { booking: cancelled, decision, refund_initiated: false, already_cancelled: false });
            }

            let refunded = self.issue_refund(cancelled).await;
            let refund_initiated = refunded.refund_status == Some(RefundStatus::Requested);
            return Ok(CancellationOutcome { booking: refunded, decision, refund_initiated, already_cancelled: false });
        }

        Err(AppError::Conflict("Booking changed concurrently, please retry".into()))
    }

    /// Re-issues a refund that previously failed.
    pub async fn retry_refund(&self, actor_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        self.load_for_party(actor_id, booking_id).await?;

        let claimed = self.booking_repo.claim_refund_retry(booking_id).await?
            .ok_or(AppError::Conflict("Refund is not in a failed state".into()))?;

        let booking = self.issue_refund(claimed).await;
        if booking.refund_status == Some(RefundStatus::Failed) {
            return Err(AppError::Upstream("Refund retry failed".into()));
        }
        Ok(booking)
    }

    /// Calls the processor for a booking already marked refunding. A failure
    /// is recorded on the booking and never reverts the cancellation.
    async fn issue_refund(&self, booking: Booking) -> Booking {
        let Some(reference) = booking.payment_reference.clone() else {
            error!("Booking {} is refunding without a payment reference", booking.id);
            return self.mark_refund(booking, RefundStatus::Failed, None).await;
        };

        match self.payment_gateway.issue_refund(&reference, booking.total_price_cents, &booking.currency).await {
            Ok(refund_id) => {
                info!("Refund {} requested for booking {}", refund_id, booking.id);
                self.mark_refund(booking, RefundStatus::Requested, Some(&refund_id)).await
            }
            Err(e) => {
                error!("Refund for booking {} failed: {}", booking.id, e);
                self.mark_refund(booking, RefundStatus::Failed, None).await
            }
        }
    }

    async fn mark_refund(&self, booking: Booking, status: RefundStatus, refund_reference: Option<&str>) -> Booking {
        match self.booking_repo.update_refund_state(&booking.id, PaymentStatus::Refunding, status, refund_reference).await {
            Ok(Some(updated)) => updated,
            Ok(None) => booking,
            Err(e) => {
                error!("Could not record refund state {} for booking {}: {:?}", status, booking.id, e);
                booking
            }
        }
    }

    /// Applies the processor's verdict on a refund.
    pub async fn record_refund_result(&self, booking_id: &str, succeeded: bool, refund_reference: Option<&str>) -> Result<Booking, AppError> {
        let (payment_status, refund_status) = if succeeded {
            (PaymentStatus::Refunded, RefundStatus::Succeeded)
        } else {
            (PaymentStatus::Refunding, RefundStatus::Failed)
        };

        if let Some(updated) = self.booking_repo.update_refund_state(booking_id, payment_status, refund_status, refund_reference).await? {
            info!("Refund for booking {} is now {}", booking_id, refund_status);
            return Ok(updated);
        }

        let current = self.load(booking_id).await?;
        if current.payment_status == PaymentStatus::Refunded {
            return Ok(current);
        }
        Err(AppError::Conflict(format!("Booking payment is {}, no refund in progress", current.payment_status)))
    }
}

fn authorize_role(booking: &Booking, actor_id: &str, role: PartyRole) -> Result<(), AppError> {
    let allowed = match role {
        PartyRole::Renter => booking.renter_id == actor_id,
        PartyRole::Owner => booking.owner_id() == Some(actor_id),
    };
    if !allowed {
        return Err(AppError::Forbidden(format!("Caller is not the {} of this booking", role)));
    }
    Ok(())
}
