use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Money the processor has transferred to an owner.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payout {
    pub id: String,
    pub owner_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub external_reference: String,
    pub paid_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(owner_id: String, amount_cents: i64, currency: String, external_reference: String, paid_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            amount_cents,
            currency,
            external_reference,
            paid_at,
        }
    }
}
