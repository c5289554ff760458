use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::webhook::PaymentProcessor;
use crate::api::dtos::requests::{ConfirmPaymentRequest, PaymentWebhookEvent};
use crate::api::dtos::responses::{BookingView, WebhookAck};
use crate::domain::models::payout::Payout;
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::info;

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    _processor: PaymentProcessor,
    Path(booking_id): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.payment_reference.trim().is_empty() {
        return Err(AppError::validation("payment_reference", "must not be empty"));
    }
    let now = Utc::now();
    let booking = state.booking_service.confirm_payment(&booking_id, &payload.payment_reference, now).await?;
    Ok(Json(BookingView::new(booking, now)))
}

pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    _processor: PaymentProcessor,
    Json(event): Json<PaymentWebhookEvent>,
) -> Result<impl IntoResponse, AppError> {
    match event {
        PaymentWebhookEvent::PaymentSucceeded { booking_id, payment_reference } => {
            state.booking_service.confirm_payment(&booking_id, &payment_reference, Utc::now()).await?;
        }
        PaymentWebhookEvent::RefundSucceeded { booking_id, refund_id } => {
            state.booking_service.record_refund_result(&booking_id, true, refund_id.as_deref()).await?;
        }
        PaymentWebhookEvent::RefundFailed { booking_id, refund_id } => {
            state.booking_service.record_refund_result(&booking_id, false, refund_id.as_deref()).await?;
        }
        PaymentWebhookEvent::PayoutPaid { owner_id, amount_cents, currency, payout_id, paid_at } => {
            if amount_cents <= 0 {
                return Err(AppError::validation("amount_cents", "must be positive"));
            }
            let payout = Payout::new(owner_id, amount_cents, currency.to_ascii_uppercase(), payout_id, paid_at.unwrap_or_else(Utc::now));
            state.payout_repo.record(&payout).await?;
            info!("Payout {} of {} {} recorded for owner {}", payout.external_reference, payout.amount_cents, payout.currency, payout.owner_id);
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
