use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateParkingRequest, ParkingSearchQuery, UpdateParkingRequest};
use crate::domain::models::parking::{NewParkingParams, Parking, ParkingType};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

fn validate_prices(price_hour_cents: i64, price_day_cents: Option<i64>) -> Result<(), AppError> {
    if price_hour_cents < 0 {
        return Err(AppError::validation("price_hour_cents", "must not be negative"));
    }
    if price_day_cents.is_some_and(|d| d < 0) {
        return Err(AppError::validation("price_day_cents", "must not be negative"));
    }
    Ok(())
}

fn validate_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), AppError> {
    if lat.is_some_and(|v| !(-90.0..=90.0).contains(&v)) {
        return Err(AppError::validation("lat", "must be between -90 and 90"));
    }
    if lng.is_some_and(|v| !(-180.0..=180.0).contains(&v)) {
        return Err(AppError::validation("lng", "must be between -180 and 180"));
    }
    Ok(())
}

fn normalize_currency(raw: &str) -> Result<String, AppError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation("currency", "expected a 3-letter ISO code"));
    }
    Ok(code)
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::validation(field, "must not be empty"));
    }
    Ok(value)
}

pub async fn create_parking(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateParkingRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_prices(payload.price_hour_cents, payload.price_day_cents)?;
    validate_coordinates(payload.lat, payload.lng)?;
    let currency = match &payload.currency {
        Some(c) => normalize_currency(c)?,
        None => state.config.policy.default_currency.clone(),
    };

    let parking = Parking::new(NewParkingParams {
        owner_id: user_id,
        title: required("title", payload.title)?,
        description: payload.description,
        address_line: required("address_line", payload.address_line)?,
        postal_code: required("postal_code", payload.postal_code)?,
        city: required("city", payload.city)?,
        country: payload.country.unwrap_or_else(|| "CH".to_string()),
        parking_type: payload.parking_type.unwrap_or(ParkingType::Outdoor),
        is_covered: payload.is_covered,
        has_ev_charging: payload.has_ev_charging,
        is_secure: payload.is_secure,
        is_lit: payload.is_lit,
        price_hour_cents: payload.price_hour_cents,
        price_day_cents: payload.price_day_cents,
        currency,
        lat: payload.lat,
        lng: payload.lng,
    });

    let created = state.parking_repo.create(&parking).await?;
    info!("Parking {} created by owner {}", created.id, created.owner_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_parkings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ParkingSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let parkings = state.parking_repo.search_active(city).await?;
    Ok(Json(parkings))
}

pub async fn get_parking(
    State(state): State<Arc<AppState>>,
    Path(parking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let parking = state.parking_repo.find_by_id(&parking_id).await?
        .ok_or(AppError::NotFound("Parking not found".into()))?;
    Ok(Json(parking))
}

/// Loads a parking and checks that the caller owns it.
pub async fn load_owned(state: &AppState, parking_id: &str, user_id: &str) -> Result<Parking, AppError> {
    let parking = state.parking_repo.find_by_id(parking_id).await?
        .ok_or(AppError::NotFound("Parking not found".into()))?;
    if !parking.is_owned_by(user_id) {
        return Err(AppError::Forbidden("Only the owner can change this parking".into()));
    }
    Ok(parking)
}

pub async fn update_parking(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(parking_id): Path<String>,
    Json(payload): Json<UpdateParkingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut parking = load_owned(&state, &parking_id, &user_id).await?;

    if let Some(v) = payload.title { parking.title = required("title", v)?; }
    if let Some(v) = payload.description { parking.description = Some(v); }
    if let Some(v) = payload.address_line { parking.address_line = required("address_line", v)?; }
    if let Some(v) = payload.postal_code { parking.postal_code = required("postal_code", v)?; }
    if let Some(v) = payload.city { parking.city = required("city", v)?; }
    if let Some(v) = payload.country { parking.country = v; }
    if let Some(v) = payload.parking_type { parking.parking_type = v; }
    if let Some(v) = payload.is_covered { parking.is_covered = v; }
    if let Some(v) = payload.has_ev_charging { parking.has_ev_charging = v; }
    if let Some(v) = payload.is_secure { parking.is_secure = v; }
    if let Some(v) = payload.is_lit { parking.is_lit = v; }
    if let Some(v) = payload.price_hour_cents { parking.price_hour_cents = v; }
    if payload.price_day_cents.is_some() { parking.price_day_cents = payload.price_day_cents; }
    if payload.lat.is_some() { parking.lat = payload.lat; }
    if payload.lng.is_some() { parking.lng = payload.lng; }
    if let Some(v) = payload.is_active { parking.is_active = v; }

    validate_prices(parking.price_hour_cents, parking.price_day_cents)?;
    validate_coordinates(parking.lat, parking.lng)?;

    let updated = state.parking_repo.update(&parking).await?;
    info!("Parking {} updated (active: {})", updated.id, updated.is_active);
    Ok(Json(updated))
}

pub async fn list_owner_parkings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let parkings = state.parking_repo.list_by_owner(&user_id).await?;
    Ok(Json(parkings))
}
