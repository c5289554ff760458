mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::json;
use tokio::task::JoinSet;
use tower::ServiceExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_overlapping_bookings_admit_exactly_one() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let start = (Utc::now() + Duration::days(2)).date_naive().and_hms_opt(10, 0, 0).unwrap().and_utc();

    let mut set = JoinSet::new();
    for i in 0..12 {
        let router = app.router.clone();
        let token = app.token(&format!("renter-{}", i));
        // Every window overlaps [10:00, 12:00)
        let body = json!({
            "parking_id": parking_id,
            "start_time": (start + Duration::minutes(i * 5)).to_rfc3339(),
            "end_time": (start + Duration::hours(2)).to_rfc3339(),
        });
        set.spawn(async move {
            let request = Request::builder().method("POST").uri("/api/v1/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())).unwrap();
            router.oneshot(request).await.unwrap().status()
        });
    }

    let mut created = 0;
    let mut conflicts = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 11);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE parking_id = ?")
        .bind(&parking_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_concurrent_bookings_all_succeed() {
    let app = TestApp::new().await;
    let parking_id = app.create_parking("owner-1", 500).await;
    let start = (Utc::now() + Duration::days(2)).date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();

    let mut set = JoinSet::new();
    for i in 0..8 {
        let router = app.router.clone();
        let token = app.token("renter-1");
        let body = json!({
            "parking_id": parking_id,
            "start_time": (start + Duration::hours(i)).to_rfc3339(),
            "end_time": (start + Duration::hours(i + 1)).to_rfc3339(),
        });
        set.spawn(async move {
            let request = Request::builder().method("POST").uri("/api/v1/bookings")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())).unwrap();
            router.oneshot(request).await.unwrap().status()
        });
    }

    while let Some(res) = set.join_next().await {
        assert_eq!(res.unwrap(), StatusCode::CREATED);
    }
}
