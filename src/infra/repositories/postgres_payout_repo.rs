use crate::domain::{models::payout::Payout, ports::PayoutRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresPayoutRepo {
    pool: PgPool,
}

impl PostgresPayoutRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayoutRepository for PostgresPayoutRepo {
    async fn record(&self, payout: &Payout) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO payouts (id, owner_id, amount_cents, currency, external_reference, paid_at) VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (external_reference) DO NOTHING"
        )
            .bind(&payout.id).bind(&payout.owner_id).bind(payout.amount_cents).bind(&payout.currency)
            .bind(&payout.external_reference).bind(payout.paid_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Payout>, AppError> {
        sqlx::query_as::<_, Payout>("SELECT * FROM payouts WHERE owner_id = $1 ORDER BY paid_at DESC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
