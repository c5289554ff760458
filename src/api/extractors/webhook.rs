use axum::{
    extract::{FromRequestParts, FromRef},
    http::request::Parts,
};
use crate::state::AppState;
use crate::error::AppError;
use std::sync::Arc;
use tracing::warn;

pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

/// A request made by the payment processor.
pub struct PaymentProcessor;

impl<S> FromRequestParts<S> for PaymentProcessor
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let provided = parts.headers.get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        if provided != app_state.config.payment_webhook_secret {
            warn!("Payment callback with wrong webhook secret");
            return Err(AppError::Unauthorized);
        }

        Ok(PaymentProcessor)
    }
}
