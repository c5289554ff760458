use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::text_enum;

text_enum! {
    pub enum ParkingType {
        Outdoor => "outdoor",
        Indoor => "indoor",
        Garage => "garage",
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Parking {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub address_line: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    #[sqlx(try_from = "String")]
    pub parking_type: ParkingType,
    pub is_covered: bool,
    pub has_ev_charging: bool,
    pub is_secure: bool,
    pub is_lit: bool,
    pub price_hour_cents: i64,
    pub price_day_cents: Option<i64>,
    pub currency: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewParkingParams {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub address_line: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub parking_type: ParkingType,
    pub is_covered: bool,
    pub has_ev_charging: bool,
    pub is_secure: bool,
    pub is_lit: bool,
    pub price_hour_cents: i64,
    pub price_day_cents: Option<i64>,
    pub currency: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Parking {
    pub fn new(params: NewParkingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: params.owner_id,
            title: params.title,
            description: params.description,
            address_line: params.address_line,
            postal_code: params.postal_code,
            city: params.city,
            country: params.country,
            parking_type: params.parking_type,
            is_covered: params.is_covered,
            has_ev_charging: params.has_ev_charging,
            is_secure: params.is_secure,
            is_lit: params.is_lit,
            price_hour_cents: params.price_hour_cents,
            price_day_cents: params.price_day_cents,
            currency: params.currency,
            lat: params.lat,
            lng: params.lng,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// The slice of a parking that travels with a booking when the two are read
/// together.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParkingSnapshot {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub city: String,
    pub is_active: bool,
}

impl From<&Parking> for ParkingSnapshot {
    fn from(parking: &Parking) -> Self {
        Self {
            id: parking.id.clone(),
            owner_id: parking.owner_id.clone(),
            title: parking.title.clone(),
            city: parking.city.clone(),
            is_active: parking.is_active,
        }
    }
}
