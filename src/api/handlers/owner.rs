use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::earnings::{build_wallet, earnings_entries, monthly_rollup, EarningsEntry};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;

async fn owner_entries(state: &AppState, owner_id: &str) -> Result<Vec<EarningsEntry>, AppError> {
    let bookings = state.booking_repo.list_earning_bookings(owner_id).await?;
    let policy = &state.config.policy;
    Ok(earnings_entries(&bookings, policy.platform_fee_rate, &policy.default_currency))
}

pub async fn get_wallet(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = owner_entries(&state, &user_id).await?;
    let payouts = state.payout_repo.list_by_owner(&user_id).await?;
    let wallet = build_wallet(&entries, &payouts, Utc::now(), &state.config.policy.default_currency);
    Ok(Json(wallet))
}

pub async fn get_monthly_earnings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let entries = owner_entries(&state, &user_id).await?;
    Ok(Json(monthly_rollup(&entries)))
}
