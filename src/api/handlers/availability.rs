use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::ReplaceAvailabilityRequest;
use crate::api::handlers::parking::load_owned;
use crate::domain::services::availability::{build_slots, normalize_slots, SlotDraft};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn replace_availability(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(parking_id): Path<String>,
    Json(payload): Json<ReplaceAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    load_owned(&state, &parking_id, &user_id).await?;

    let drafts: Vec<SlotDraft> = payload.slots.into_iter().map(SlotDraft::from).collect();
    let slots = build_slots(&parking_id, drafts)?;

    state.availability_repo.replace_for_parking(&parking_id, &slots).await?;
    info!("Availability of parking {} replaced with {} slots", parking_id, slots.len());

    Ok(Json(normalize_slots(slots)))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(parking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.parking_repo.find_by_id(&parking_id).await?
        .ok_or(AppError::NotFound("Parking not found".into()))?;

    let slots = state.availability_repo.list_by_parking(&parking_id).await?;
    Ok(Json(normalize_slots(slots)))
}
