mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use parking_backend::domain::services::booking_service::CreateBookingCommand;
use serde_json::json;

#[tokio::test]
async fn test_pending_hold_expires_after_ttl() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let service = &app.state.booking_service;

    let now = Utc::now();
    let start = now + Duration::days(2);
    let end = start + Duration::hours(2);
    let booking = service.create_booking("renter-a", CreateBookingCommand {
        parking_id: parking_id.clone(),
        start,
        end,
        expected_price_cents: None,
        currency: None,
    }, now).await.unwrap();
    assert_eq!(booking.expires_at, now + Duration::minutes(10));

    // Before the TTL nothing changes
    assert!(!service.expire_pending(&booking.id, now + Duration::minutes(9)).await.unwrap());
    assert!(!service.is_available(&parking_id, start, end, now + Duration::minutes(9)).await.unwrap());

    // A lapsed hold no longer blocks, even before the sweep
    assert!(service.is_available(&parking_id, start, end, now + Duration::minutes(10)).await.unwrap());

    assert!(service.expire_pending(&booking.id, now + Duration::minutes(11)).await.unwrap());
    assert!(!service.expire_pending(&booking.id, now + Duration::minutes(12)).await.unwrap());

    let (_, body) = app.send("GET", &format!("/api/v1/bookings/{}", booking.id), Some("renter-a"), None).await;
    assert_eq!(body["status"], "expired");
    assert_eq!(body["display_status"], "expired");

    // Paid after expiry: the money goes back, the booking stays expired
    let (status, body) = app.confirm(&booking.id, "pi_late").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "expired");
    assert_eq!(body["payment_status"], "refunding");
    assert_eq!(app.refund_calls(), 1);

    let (status, _) = app.send("POST", &format!("/api/v1/bookings/{}/cancel", booking.id), Some("renter-a"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_lapsed_hold_gives_way_to_new_booking() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let service = &app.state.booking_service;

    let now = Utc::now();
    let start = now + Duration::days(2);
    let cmd = || CreateBookingCommand {
        parking_id: parking_id.clone(),
        start,
        end: start + Duration::hours(2),
        expected_price_cents: None,
        currency: None,
    };

    let stale = service.create_booking("renter-a", cmd(), now - Duration::minutes(30)).await.unwrap();
    let fresh = service.create_booking("renter-b", cmd(), now).await.unwrap();
    assert_ne!(stale.id, fresh.id);

    // The first renter paid too late and the window is taken now
    let refunded = service.confirm_payment(&stale.id, "pi_slow", now).await.unwrap();
    assert_eq!(refunded.status.as_str(), "expired");
    assert_eq!(refunded.payment_status.as_str(), "refunding");
    assert_eq!(refunded.payment_reference.as_deref(), Some("pi_slow"));
    assert_eq!(app.refund_calls(), 1);

    assert!(service.confirm_payment(&fresh.id, "pi_fast", now).await.is_ok());
}

#[tokio::test]
async fn test_late_payment_is_accepted_while_window_is_free() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let service = &app.state.booking_service;

    let now = Utc::now();
    let start = now + Duration::days(2);
    let booking = service.create_booking("renter-a", CreateBookingCommand {
        parking_id,
        start,
        end: start + Duration::hours(1),
        expected_price_cents: None,
        currency: None,
    }, now - Duration::minutes(20)).await.unwrap();

    let confirmed = service.confirm_payment(&booking.id, "pi_late", now).await.unwrap();
    assert_eq!(confirmed.status.as_str(), "confirmed");
}

#[tokio::test]
async fn test_sweep_expires_every_stale_hold() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let service = &app.state.booking_service;

    let now = Utc::now();
    for day in 1..=3 {
        let start = now + Duration::days(day);
        service.create_booking("renter-a", CreateBookingCommand {
            parking_id: parking_id.clone(),
            start,
            end: start + Duration::hours(1),
            expected_price_cents: None,
            currency: None,
        }, now).await.unwrap();
    }

    assert_eq!(service.sweep_expired(now + Duration::minutes(5)).await.unwrap(), 0);
    assert_eq!(service.sweep_expired(now + Duration::minutes(10)).await.unwrap(), 3);
    assert_eq!(service.sweep_expired(now + Duration::minutes(20)).await.unwrap(), 0);
}
