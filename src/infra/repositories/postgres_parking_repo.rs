use crate::domain::{models::parking::Parking, ports::ParkingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresParkingRepo {
    pool: PgPool,
}

impl PostgresParkingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParkingRepository for PostgresParkingRepo {
    async fn create(&self, parking: &Parking) -> Result<Parking, AppError> {
        sqlx::query_as::<_, Parking>(
            r#"INSERT INTO parkings (
                id, owner_id, title, description, address_line, postal_code, city, country,
                parking_type, is_covered, has_ev_charging, is_secure, is_lit,
                price_hour_cents, price_day_cents, currency, lat, lng, is_active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *"#
        )
            .bind(&parking.id)
            .bind(&parking.owner_id)
            .bind(&parking.title)
            .bind(&parking.description)
            .bind(&parking.address_line)
            .bind(&parking.postal_code)
            .bind(&parking.city)
            .bind(&parking.country)
            .bind(parking.parking_type.as_str())
            .bind(parking.is_covered)
            .bind(parking.has_ev_charging)
            .bind(parking.is_secure)
            .bind(parking.is_lit)
            .bind(parking.price_hour_cents)
            .bind(parking.price_day_cents)
            .bind(&parking.currency)
            .bind(parking.lat)
            .bind(parking.lng)
            .bind(parking.is_active)
            .bind(parking.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Parking>, AppError> {
        sqlx::query_as::<_, Parking>("SELECT * FROM parkings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, parking: &Parking) -> Result<Parking, AppError> {
        sqlx::query_as::<_, Parking>(
            r#"UPDATE parkings SET
                title = $1, description = $2, address_line = $3, postal_code = $4, city = $5, country = $6,
                parking_type = $7, is_covered = $8, has_ev_charging = $9, is_secure = $10, is_lit = $11,
                price_hour_cents = $12, price_day_cents = $13, currency = $14, lat = $15, lng = $16, is_active = $17
            WHERE id = $18
            RETURNING *"#
        )
            .bind(&parking.title)
            .bind(&parking.description)
            .bind(&parking.address_line)
            .bind(&parking.postal_code)
            .bind(&parking.city)
            .bind(&parking.country)
            .bind(parking.parking_type.as_str())
            .bind(parking.is_covered)
            .bind(parking.has_ev_charging)
            .bind(parking.is_secure)
            .bind(parking.is_lit)
            .bind(parking.price_hour_cents)
            .bind(parking.price_day_cents)
            .bind(&parking.currency)
            .bind(parking.lat)
            .bind(parking.lng)
            .bind(parking.is_active)
            .bind(&parking.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Parking not found".into()))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Parking>, AppError> {
        sqlx::query_as::<_, Parking>("SELECT * FROM parkings WHERE owner_id = $1 ORDER BY created_at DESC")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn search_active(&self, city: Option<&str>) -> Result<Vec<Parking>, AppError> {
        sqlx::query_as::<_, Parking>(
            "SELECT * FROM parkings WHERE is_active AND ($1::text IS NULL OR lower(city) = lower($1)) ORDER BY created_at DESC"
        )
            .bind(city)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
