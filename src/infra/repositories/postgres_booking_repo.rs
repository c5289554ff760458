use crate::domain::models::booking::{Booking, BookingStatus, PaymentStatus, RefundStatus};
use crate::domain::ports::{BookingRepository, CancellationRecord};
use crate::error::{conflict_on_overlap, AppError};
use super::rows::{into_booking, into_bookings, BookingRow, BOOKING_WITH_PARKING};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use chrono::{DateTime, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn reload(&self, id: Option<String>) -> Result<Option<Booking>, AppError> {
        match id {
            Some(id) => self.find_by_id(&id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create_if_available(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Lapsed holds still sit inside the exclusion constraint until expired.
        sqlx::query(
            "UPDATE bookings SET status = 'expired'
             WHERE parking_id = $1 AND status = 'pending_payment' AND expires_at <= $2 AND start_time < $3 AND end_time > $4"
        )
            .bind(&booking.parking_id).bind(now).bind(booking.end_time).bind(booking.start_time)
            .execute(&mut *tx).await.map_err(conflict_on_overlap)?;

        let id: String = sqlx::query_scalar(
            "INSERT INTO bookings (id, parking_id, renter_id, start_time, end_time, total_price_cents, currency, status, payment_status, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id"
        )
            .bind(&booking.id)
            .bind(&booking.parking_id)
            .bind(&booking.renter_id)
            .bind(booking.start_time)
            .bind(booking.end_time)
            .bind(booking.total_price_cents)
            .bind(&booking.currency)
            .bind(booking.status.as_str())
            .bind(booking.payment_status.as_str())
            .bind(booking.expires_at)
            .bind(booking.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(conflict_on_overlap)?;

        tx.commit().await.map_err(conflict_on_overlap)?;

        self.find_by_id(&id).await?
            .ok_or(AppError::InternalWithMsg("Inserted booking vanished".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_WITH_PARKING} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .map(into_booking)
            .transpose()
    }

    async fn count_overlap(&self, parking_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Result<i64, AppError> {
        let result = sqlx::query(
            "SELECT COUNT(*) as count FROM bookings
             WHERE parking_id = $1 AND start_time < $2 AND end_time > $3
               AND (status = 'confirmed' OR (status = 'pending_payment' AND expires_at > $4))"
        )
            .bind(parking_id).bind(end).bind(start).bind(now)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.get::<i64, _>("count"))
    }

    async fn list_by_renter(&self, renter_id: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_WITH_PARKING} WHERE b.renter_id = $1 ORDER BY b.start_time DESC"))
            .bind(renter_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        into_bookings(rows)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_WITH_PARKING} WHERE p.owner_id = $1 ORDER BY b.start_time DESC"))
            .bind(owner_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        into_bookings(rows)
    }

    async fn list_earning_bookings(&self, owner_id: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{BOOKING_WITH_PARKING} WHERE p.owner_id = $1 AND b.payment_status = 'paid' AND b.status = 'confirmed' ORDER BY b.start_time ASC"
        ))
            .bind(owner_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        into_bookings(rows)
    }

    async fn confirm_payment(&self, id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let confirmed: Option<String> = sqlx::query_scalar(
            "UPDATE bookings SET status = 'confirmed', payment_status = 'paid', payment_reference = $1
             WHERE id = $2 AND status = 'pending_payment'
               AND NOT EXISTS (
                 SELECT 1 FROM bookings o
                 WHERE o.parking_id = bookings.parking_id AND o.id != bookings.id
                   AND o.start_time < bookings.end_time AND o.end_time > bookings.start_time
                   AND (o.status = 'confirmed' OR (o.status = 'pending_payment' AND o.expires_at > $3))
               )
             RETURNING id"
        )
            .bind(payment_reference)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_on_overlap)?;
        self.reload(confirmed).await
    }

    async fn record_late_payment(&self, id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let recorded: Option<String> = sqlx::query_scalar(
            "UPDATE bookings
             SET status = CASE WHEN status = 'pending_payment' THEN 'expired' ELSE status END,
                 payment_reference = $1, payment_status = 'refunding', refund_status = 'requested',
                 refund_reason = 'payment_after_close'
             WHERE id = $2 AND payment_status = 'unpaid'
               AND (status IN ('cancelled_by_renter', 'cancelled_by_owner', 'expired')
                    OR (status = 'pending_payment' AND expires_at <= $3))
             RETURNING id"
        )
            .bind(payment_reference)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        self.reload(recorded).await
    }

    async fn expire_pending(&self, id: &str, now: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE bookings SET status = 'expired' WHERE id = $1 AND status = 'pending_payment' AND expires_at <= $2")
            .bind(id).bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE bookings SET status = 'expired' WHERE status = 'pending_payment' AND expires_at <= $1")
            .bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn cancel(&self, id: &str, record: CancellationRecord<'_>) -> Result<Option<Booking>, AppError> {
        let cancelled: Option<String> = sqlx::query_scalar(
            "UPDATE bookings SET status = $1, cancelled_at = $2, cancelled_by = $3, refund_reason = $4, payment_status = $5, refund_status = $6
             WHERE id = $7 AND status IN ('pending_payment', 'confirmed') AND payment_status = $8
             RETURNING id"
        )
            .bind(BookingStatus::cancelled_by(record.role).as_str())
            .bind(record.at)
            .bind(record.role.as_str())
            .bind(record.refund_reason)
            .bind(record.payment_status.as_str())
            .bind(record.refund_status.map(|s| s.as_str()))
            .bind(id)
            .bind(record.expected_payment_status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        self.reload(cancelled).await
    }

    async fn update_refund_state(
        &self,
        id: &str,
        payment_status: PaymentStatus,
        refund_status: RefundStatus,
        refund_reference: Option<&str>,
    ) -> Result<Option<Booking>, AppError> {
        let updated: Option<String> = sqlx::query_scalar(
            "UPDATE bookings SET payment_status = $1, refund_status = $2, refund_reference = COALESCE($3, refund_reference)
             WHERE id = $4 AND payment_status = 'refunding'
             RETURNING id"
        )
            .bind(payment_status.as_str())
            .bind(refund_status.as_str())
            .bind(refund_reference)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        self.reload(updated).await
    }

    async fn claim_refund_retry(&self, id: &str) -> Result<Option<Booking>, AppError> {
        let claimed: Option<String> = sqlx::query_scalar(
            "UPDATE bookings SET refund_status = 'requested'
             WHERE id = $1 AND payment_status = 'refunding' AND refund_status = 'failed'
             RETURNING id"
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        self.reload(claimed).await
    }
}
