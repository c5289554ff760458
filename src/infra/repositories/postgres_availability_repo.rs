use crate::domain::{models::availability::AvailabilitySlot, ports::AvailabilityRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAvailabilityRepo {
    pool: PgPool,
}

impl PostgresAvailabilityRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepo {
    async fn replace_for_parking(&self, parking_id: &str, slots: &[AvailabilitySlot]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM availability_slots WHERE parking_id = $1").bind(parking_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        for slot in slots {
            sqlx::query("INSERT INTO availability_slots (id, parking_id, weekday, start_time, end_time, enabled) VALUES ($1, $2, $3, $4, $5, $6)")
                .bind(&slot.id).bind(parking_id).bind(slot.weekday).bind(&slot.start_time).bind(&slot.end_time).bind(slot.enabled)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_parking(&self, parking_id: &str) -> Result<Vec<AvailabilitySlot>, AppError> {
        sqlx::query_as::<_, AvailabilitySlot>("SELECT * FROM availability_slots WHERE parking_id = $1 ORDER BY weekday ASC, start_time ASC")
            .bind(parking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
