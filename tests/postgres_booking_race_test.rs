use parking_backend::{
    domain::models::booking::{Booking, NewBookingParams},
    domain::models::parking::{NewParkingParams, Parking, ParkingType},
    domain::ports::{BookingRepository, ParkingRepository},
    error::AppError,
    infra::repositories::{postgres_booking_repo::PostgresBookingRepo, postgres_parking_repo::PostgresParkingRepo},
};
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test]
async fn test_exclusion_constraint_admits_one_overlapping_booking() {
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        println!("Skipping Postgres race test (DATABASE_URL not set)");
        return;
    };
    if !db_url.starts_with("postgres") {
        println!("Skipping Postgres race test (not targeting Postgres)");
        return;
    }

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&db_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!("./migrations/postgres").run(&pool).await.unwrap();

    let parkings = PostgresParkingRepo::new(pool.clone());
    let parking = parkings.create(&Parking::new(NewParkingParams {
        owner_id: "race-owner".into(),
        title: "Race".into(),
        description: None,
        address_line: "Street 1".into(),
        postal_code: "8000".into(),
        city: "Zurich".into(),
        country: "CH".into(),
        parking_type: ParkingType::Indoor,
        is_covered: true,
        has_ev_charging: false,
        is_secure: false,
        is_lit: false,
        price_hour_cents: 500,
        price_day_cents: None,
        currency: "CHF".into(),
        lat: None,
        lng: None,
    })).await.unwrap();

    let repo = Arc::new(PostgresBookingRepo::new(pool.clone()));
    let now = Utc::now();
    let start = now + Duration::days(3);

    let mut set = JoinSet::new();
    for i in 0..20 {
        let repo = repo.clone();
        let booking = Booking::new(NewBookingParams {
            parking_id: parking.id.clone(),
            renter_id: format!("racer-{}", i),
            start: start + Duration::minutes(i),
            end: start + Duration::hours(2),
            total_price_cents: 1000,
            currency: "CHF".into(),
            hold_ttl: Duration::minutes(10),
            now,
        });
        set.spawn(async move { repo.create_if_available(&booking, now).await });
    }

    let mut created = 0;
    while let Some(res) = set.join_next().await {
        match res.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(created, 1, "Overlapping bookings were admitted");

    // A lapsed hold is swept inside the insert transaction
    let later = now + Duration::minutes(15);
    let replacement = Booking::new(NewBookingParams {
        parking_id: parking.id.clone(),
        renter_id: "late-racer".into(),
        start,
        end: start + Duration::hours(1),
        total_price_cents: 500,
        currency: "CHF".into(),
        hold_ttl: Duration::minutes(10),
        now: later,
    });
    assert!(repo.create_if_available(&replacement, later).await.is_ok());

    sqlx::query("DELETE FROM bookings WHERE parking_id = $1").bind(&parking.id).execute(&pool).await.unwrap();
    sqlx::query("DELETE FROM parkings WHERE id = $1").bind(&parking.id).execute(&pool).await.unwrap();
}
