use crate::domain::models::booking::{Booking, BookingStatus, PaymentStatus, RefundStatus};
use crate::domain::ports::{BookingRepository, CancellationRecord};
use crate::error::AppError;
use super::rows::{into_booking, into_bookings, BookingRow, BOOKING_WITH_PARKING};
use async_trait::async_trait;
use sqlx::{SqlitePool, Row};
use chrono::{DateTime, Utc};

// Timestamps are stored as RFC 3339 text in UTC, so text comparison orders them.
const BLOCKING: &str = "(status = 'confirmed' OR (status = 'pending_payment' AND expires_at > ?))";

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
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
impl BookingRepository for SqliteBookingRepo {
    async fn create_if_available(&self, booking: &Booking, now: DateTime<Utc>) -> Result<Booking, AppError> {
        // A writing statement takes the database write lock before it reads,
        // so the overlap check and the insert cannot interleave with another writer.
        let sql = format!(
            "INSERT INTO bookings (id, parking_id, renter_id, start_time, end_time, total_price_cents, currency, status, payment_status, expires_at, created_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE NOT EXISTS (
                SELECT 1 FROM bookings WHERE parking_id = ? AND start_time < ? AND end_time > ? AND {BLOCKING}
             )
             RETURNING id"
        );
        let inserted: Option<String> = sqlx::query_scalar(&sql)
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
            .bind(&booking.parking_id)
            .bind(booking.end_time)
            .bind(booking.start_time)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if inserted.is_none() {
            return Err(AppError::Conflict("Requested window overlaps an existing booking".into()));
        }
        self.reload(inserted).await?
            .ok_or(AppError::InternalWithMsg("Inserted booking vanished".into()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_WITH_PARKING} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .map(into_booking)
            .transpose()
    }

    async fn count_overlap(&self, parking_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) as count FROM bookings WHERE parking_id = ? AND start_time < ? AND end_time > ? AND {BLOCKING}");
        let result = sqlx::query(&sql).bind(parking_id).bind(end).bind(start).bind(now).fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.get::<i64, _>("count"))
    }

    async fn list_by_renter(&self, renter_id: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_WITH_PARKING} WHERE b.renter_id = ? ORDER BY b.start_time DESC"))
            .bind(renter_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        into_bookings(rows)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!("{BOOKING_WITH_PARKING} WHERE p.owner_id = ? ORDER BY b.start_time DESC"))
            .bind(owner_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        into_bookings(rows)
    }

    async fn list_earning_bookings(&self, owner_id: &str) -> Result<Vec<Booking>, AppError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{BOOKING_WITH_PARKING} WHERE p.owner_id = ? AND b.payment_status = 'paid' AND b.status = 'confirmed' ORDER BY b.start_time ASC"
        ))
            .bind(owner_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        into_bookings(rows)
    }

    async fn confirm_payment(&self, id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let confirmed: Option<String> = sqlx::query_scalar(
            "UPDATE bookings SET status = 'confirmed', payment_status = 'paid', payment_reference = ?
             WHERE id = ? AND status = 'pending_payment'
               AND NOT EXISTS (
                 SELECT 1 FROM bookings o
                 WHERE o.parking_id = bookings.parking_id AND o.id != bookings.id
                   AND o.start_time < bookings.end_time AND o.end_time > bookings.start_time
                   AND (o.status = 'confirmed' OR (o.status = 'pending_payment' AND o.expires_at > ?))
               )
             RETURNING id"
        )
            .bind(payment_reference)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        self.reload(confirmed).await
    }

    async fn record_late_payment(&self, id: &str, payment_reference: &str, now: DateTime<Utc>) -> Result<Option<Booking>, AppError> {
        let recorded: Option<String> = sqlx::query_scalar(
            "UPDATE bookings
             SET status = CASE WHEN status = 'pending_payment' THEN 'expired' ELSE status END,
                 payment_reference = ?, payment_status = 'refunding', refund_status = 'requested',
                 refund_reason = 'payment_after_close'
             WHERE id = ? AND payment_status = 'unpaid'
               AND (status IN ('cancelled_by_renter', 'cancelled_by_owner', 'expired')
                    OR (status = 'pending_payment' AND expires_at <= ?))
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
        let result = sqlx::query("UPDATE bookings SET status = 'expired' WHERE id = ? AND status = 'pending_payment' AND expires_at <= ?")
            .bind(id).bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE bookings SET status = 'expired' WHERE status = 'pending_payment' AND expires_at <= ?")
            .bind(now).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn cancel(&self, id: &str, record: CancellationRecord<'_>) -> Result<Option<Booking>, AppError> {
        let cancelled: Option<String> = sqlx::query_scalar(
            "UPDATE bookings SET status = ?, cancelled_at = ?, cancelled_by = ?, refund_reason = ?, payment_status = ?, refund_status = ?
             WHERE id = ? AND status IN ('pending_payment', 'confirmed') AND payment_status = ?
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
            "UPDATE bookings SET payment_status = ?, refund_status = ?, refund_reference = COALESCE(?, refund_reference)
             WHERE id = ? AND payment_status = 'refunding'
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
             WHERE id = ? AND payment_status = 'refunding' AND refund_status = 'failed'
             RETURNING id"
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        self.reload(claimed).await
    }
}
