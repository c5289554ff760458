use axum::{extract::{State, Path, Query}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{AvailabilityQuery, CancelBookingRequest, CreateBookingRequest, RefundPreviewQuery};
use crate::api::dtos::responses::{AvailabilityResponse, BookingView, CancelResponse, HoldView};
use crate::domain::services::booking_service::CreateBookingCommand;
use crate::domain::services::conflict::parse_instant;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let start = parse_instant("start", &query.start)?;
    let end = parse_instant("end", &query.end)?;

    let available = state.booking_service.is_available(&query.parking_id, start, end, Utc::now()).await?;

    Ok(Json(AvailabilityResponse { parking_id: query.parking_id, start, end, available }))
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let cmd = CreateBookingCommand {
        parking_id: payload.parking_id,
        start: parse_instant("start_time", &payload.start_time)?,
        end: parse_instant("end_time", &payload.end_time)?,
        expected_price_cents: payload.expected_price_cents,
        currency: payload.currency,
    };

    let now = Utc::now();
    let booking = state.booking_service.create_booking(&user_id, cmd, now).await?;
    Ok((StatusCode::CREATED, Json(BookingView::new(booking, now))))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_renter(&user_id).await?;
    Ok(Json(BookingView::list(bookings, Utc::now())))
}

pub async fn list_owner_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_owner(&user_id).await?;
    Ok(Json(BookingView::list(bookings, Utc::now())))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let (booking, _) = state.booking_service.load_for_party(&user_id, &booking_id).await?;
    let booking = state.booking_service.settle_expiry(booking, now).await?;
    Ok(Json(BookingView::new(booking, now)))
}

pub async fn start_checkout(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let (booking, redirect_url) = state.booking_service.start_checkout(&user_id, &booking_id, now).await?;
    Ok(Json(HoldView::new(&booking, now, Some(redirect_url))))
}

pub async fn payment_hold(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let booking = state.booking_service.payment_hold(&user_id, &booking_id).await?;
    let booking = state.booking_service.settle_expiry(booking, now).await?;
    Ok(Json(HoldView::new(&booking, now, None)))
}

pub async fn refund_preview(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<String>,
    Query(query): Query<RefundPreviewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let decision = state.booking_service.preview_refund(&user_id, &booking_id, query.role, Utc::now()).await?;
    Ok(Json(decision))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = match payload.role {
        Some(role) => role,
        None => state.booking_service.load_for_party(&user_id, &booking_id).await?.1,
    };

    let now = Utc::now();
    let outcome = state.booking_service.cancel_booking(&user_id, &booking_id, role, now).await?;

    Ok(Json(CancelResponse {
        ok: true,
        refunded: outcome.refund_initiated,
        reason: outcome.decision.reason,
        already_cancelled: outcome.already_cancelled,
        booking: BookingView::new(outcome.booking, now),
    }))
}

pub async fn retry_refund(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service.retry_refund(&user_id, &booking_id).await?;
    Ok(Json(BookingView::new(booking, Utc::now())))
}
