use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts},
};
use crate::state::AppState;
use crate::domain::models::auth::Claims;
use crate::error::AppError;
use std::sync::Arc;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{Span, warn};

/// The authenticated caller. Every engine call receives this id explicitly.
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid JWT public key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[app_state.config.auth_audience.as_str()]);
        validation.set_issuer(&[app_state.config.auth_issuer.as_str()]);

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| {
                warn!("Rejected bearer token: {}", e);
                AppError::Unauthorized
            })?;

        Span::current().record("user_id", token_data.claims.sub.as_str());

        Ok(AuthUser(token_data.claims.sub))
    }
}
