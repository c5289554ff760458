mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use common::TestApp;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

/// Books and pays `[start, start + 2h)`, returning the booking id.
async fn paid_booking(app: &TestApp, parking_id: &str, renter: &str, start: DateTime<Utc>) -> String {
    let (status, body) = app.send("POST", "/api/v1/bookings", Some(renter), Some(json!({
        "parking_id": parking_id,
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(2)).to_rfc3339(),
    }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["id"].as_str().unwrap().to_string();
    let (status, _) = app.confirm(&id, &format!("pi_{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    id
}

async fn cancel(app: &TestApp, id: &str, user: &str, role: Option<&str>) -> (StatusCode, Value) {
    let body = match role {
        Some(r) => json!({ "role": r }),
        None => json!({}),
    };
    app.send("POST", &format!("/api/v1/bookings/{}/cancel", id), Some(user), Some(body)).await
}

#[tokio::test]
async fn test_renter_cancellation_inside_cutoff_does_not_refund() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let id = paid_booking(&app, &parking_id, "renter-a", Utc::now() + Duration::hours(5)).await;

    let (status, preview) = app.send("GET", &format!("/api/v1/bookings/{}/refund-preview", id), Some("renter-a"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview, json!({ "refund": false, "reason": "late_cancellation" }));

    let (status, body) = cancel(&app, &id, "renter-a", None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["refunded"], false);
    assert_eq!(body["reason"], "late_cancellation");
    assert_eq!(body["booking"]["status"], "cancelled_by_renter");
    assert_eq!(body["booking"]["cancelled_by"], "renter");
    assert_eq!(body["booking"]["payment_status"], "paid");
    assert_eq!(app.refund_calls(), 0);
}

#[tokio::test]
async fn test_renter_cancellation_two_days_ahead_refunds() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let id = paid_booking(&app, &parking_id, "renter-a", Utc::now() + Duration::hours(48)).await;

    let (status, body) = cancel(&app, &id, "renter-a", Some("renter")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["refunded"], true);
    assert_eq!(body["reason"], "before_cutoff");
    assert_eq!(body["booking"]["payment_status"], "refunding");
    assert_eq!(body["booking"]["refund_status"], "requested");
    assert_eq!(body["booking"]["refund_reference"], format!("re_pi_{}", id));
    assert_eq!(app.refund_calls(), 1);

    let (status, _) = app.webhook("/api/v1/payments/webhook", json!({
        "type": "refund_succeeded", "booking_id": id, "refund_id": format!("re_pi_{}", id)
    })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", &format!("/api/v1/bookings/{}", id), Some("renter-a"), None).await;
    assert_eq!(body["payment_status"], "refunded");
    assert_eq!(body["refund_status"], "succeeded");
    assert_eq!(body["status"], "cancelled_by_renter");
}

#[tokio::test]
async fn test_owner_cancellation_shortly_before_start_refunds() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let id = paid_booking(&app, &parking_id, "renter-a", Utc::now() + Duration::minutes(10)).await;

    let (_, preview) = app.send("GET", &format!("/api/v1/bookings/{}/refund-preview?role=owner", id), Some("owner-1"), None).await;
    assert_eq!(preview["refund"], true);

    let (status, body) = cancel(&app, &id, "owner-1", Some("owner")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["refunded"], true);
    assert_eq!(body["reason"], "owner_cancelled");
    assert_eq!(body["booking"]["status"], "cancelled_by_owner");
}

#[tokio::test]
async fn test_unpaid_cancellation_never_refunds() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let start = Utc::now() + Duration::days(3);
    let (_, body) = app.send("POST", "/api/v1/bookings", Some("renter-a"), Some(json!({
        "parking_id": parking_id,
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(1)).to_rfc3339(),
    }))).await;
    let id = body["id"].as_str().unwrap();

    let (status, body) = cancel(&app, id, "owner-1", Some("owner")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refunded"], false);
    assert_eq!(body["reason"], "not_paid");
    assert_eq!(app.refund_calls(), 0);

    // A payment landing after the cancellation is refunded, the booking stays cancelled
    let (status, body) = app.confirm(id, "pi_late").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "cancelled_by_owner");
    assert_eq!(body["payment_status"], "refunding");
    assert_eq!(app.refund_calls(), 1);
}

#[tokio::test]
async fn test_payment_after_renter_cancellation_is_refunded_once() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let start = Utc::now() + Duration::days(3);
    let (_, body) = app.send("POST", "/api/v1/bookings", Some("renter-a"), Some(json!({
        "parking_id": parking_id,
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(2)).to_rfc3339(),
    }))).await;
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = cancel(&app, &id, "renter-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refunded"], false);

    let (status, body) = app.confirm(&id, "pi_late").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "cancelled_by_renter");
    assert_eq!(body["payment_status"], "refunding");
    assert_eq!(body["payment_reference"], "pi_late");
    assert_eq!(body["refund_status"], "requested");
    assert_eq!(body["refund_reason"], "payment_after_close");
    assert_eq!(body["refund_reference"], "re_pi_late");
    assert_eq!(app.refund_calls(), 1);

    // Redelivery of the same event does not refund again
    let (status, body) = app.confirm(&id, "pi_late").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled_by_renter");
    assert_eq!(app.refund_calls(), 1);

    // The window stays free
    let (_, avail) = app.send("GET", &format!(
        "/api/v1/bookings/availability?parking_id={}&start={}&end={}",
        parking_id,
        start.format("%Y-%m-%dT%H:%M:%SZ"),
        (start + Duration::hours(2)).format("%Y-%m-%dT%H:%M:%SZ"),
    ), None, None).await;
    assert_eq!(avail["available"], true);

    let (status, _) = app.webhook("/api/v1/payments/webhook", json!({
        "type": "refund_succeeded",
        "booking_id": id,
        "refund_id": "re_pi_late",
    })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.send("GET", &format!("/api/v1/bookings/{}", id), Some("renter-a"), None).await;
    assert_eq!(body["payment_status"], "refunded");
    assert_eq!(body["status"], "cancelled_by_renter");
}

#[tokio::test]
async fn test_double_cancel_refunds_once() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let start = Utc::now() + Duration::days(4);
    let id = paid_booking(&app, &parking_id, "renter-a", start).await;

    let (status, first) = cancel(&app, &id, "renter-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["refunded"], true);

    let (status, second) = cancel(&app, &id, "renter-a", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["already_cancelled"], true);
    assert_eq!(second["refunded"], false);

    let (status, _) = cancel(&app, &id, "owner-1", Some("owner")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.refund_calls(), 1);

    // The window is free again
    let (status, _) = app.send("POST", "/api/v1/bookings", Some("renter-b"), Some(json!({
        "parking_id": parking_id,
        "start_time": start.to_rfc3339(),
        "end_time": (start + Duration::hours(2)).to_rfc3339(),
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_failed_refund_keeps_cancellation_and_can_be_retried() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let id = paid_booking(&app, &parking_id, "renter-a", Utc::now() + Duration::days(3)).await;

    app.payments.fail_refunds.store(true, Ordering::SeqCst);
    let (status, body) = cancel(&app, &id, "owner-1", Some("owner")).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["refunded"], false);
    assert_eq!(body["booking"]["status"], "cancelled_by_owner");
    assert_eq!(body["booking"]["payment_status"], "refunding");
    assert_eq!(body["booking"]["refund_status"], "failed");

    let (status, _) = app.send("POST", &format!("/api/v1/bookings/{}/refund/retry", id), Some("owner-1"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = app.send("GET", &format!("/api/v1/bookings/{}", id), Some("renter-a"), None).await;
    assert_eq!(body["status"], "cancelled_by_owner");
    assert_eq!(body["refund_status"], "failed");

    app.payments.fail_refunds.store(false, Ordering::SeqCst);
    let (status, body) = app.send("POST", &format!("/api/v1/bookings/{}/refund/retry", id), Some("renter-a"), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["refund_status"], "requested");
    assert_eq!(app.refund_calls(), 3);

    // Nothing left to retry
    let (status, _) = app.send("POST", &format!("/api/v1/bookings/{}/refund/retry", id), Some("renter-a"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_requires_matching_party() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let id = paid_booking(&app, &parking_id, "renter-a", Utc::now() + Duration::days(3)).await;

    let (status, _) = cancel(&app, &id, "stranger", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The renter cannot act as the owner
    let (status, _) = cancel(&app, &id, "renter-a", Some("owner")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = cancel(&app, "missing", "renter-a", Some("renter")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.send("GET", &format!("/api/v1/bookings/{}", id), Some("renter-a"), None).await;
    assert_eq!(body["status"], "confirmed");
    assert_eq!(app.refund_calls(), 0);
}
