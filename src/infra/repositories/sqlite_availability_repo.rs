use crate::domain::{models::availability::AvailabilitySlot, ports::AvailabilityRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn replace_for_parking(&self, parking_id: &str, slots: &[AvailabilitySlot]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM availability_slots WHERE parking_id = ?").bind(parking_id).execute(&mut *tx).await.map_err(AppError::Database)?;
        for slot in slots {
            sqlx::query("INSERT INTO availability_slots (id, parking_id, weekday, start_time, end_time, enabled) VALUES (?, ?, ?, ?, ?, ?)")
                .bind(&slot.id).bind(parking_id).bind(slot.weekday).bind(&slot.start_time).bind(&slot.end_time).bind(slot.enabled)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_parking(&self, parking_id: &str) -> Result<Vec<AvailabilitySlot>, AppError> {
        sqlx::query_as::<_, AvailabilitySlot>("SELECT * FROM availability_slots WHERE parking_id = ? ORDER BY weekday ASC, start_time ASC")
            .bind(parking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
