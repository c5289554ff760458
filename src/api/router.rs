use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, parking, availability, booking, payment, owner};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Parkings
        .route("/api/v1/parkings", post(parking::create_parking).get(parking::list_parkings))
        .route("/api/v1/parkings/{parking_id}", get(parking::get_parking).put(parking::update_parking))
        .route("/api/v1/parkings/{parking_id}/availability", get(availability::get_availability).put(availability::replace_availability))

        // Bookings
        .route("/api/v1/bookings/availability", get(booking::check_availability))
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_my_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/checkout", post(booking::start_checkout))
        .route("/api/v1/bookings/{booking_id}/payment-hold", get(booking::payment_hold))
        .route("/api/v1/bookings/{booking_id}/refund-preview", get(booking::refund_preview))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/refund/retry", post(booking::retry_refund))

        // Payment processor callbacks
        .route("/api/v1/bookings/{booking_id}/confirm-payment", post(payment::confirm_payment))
        .route("/api/v1/payments/webhook", post(payment::payment_webhook))

        // Owner dashboard
        .route("/api/v1/owner/parkings", get(parking::list_owner_parkings))
        .route("/api/v1/owner/bookings", get(booking::list_owner_bookings))
        .route("/api/v1/owner/wallet", get(owner::get_wallet))
        .route("/api/v1/owner/earnings/monthly", get(owner::get_monthly_earnings))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
