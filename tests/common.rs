use parking_backend::{
    api::router::create_router,
    state::AppState,
    config::{BookingPolicy, Config},
    infra::repositories::{
        sqlite_availability_repo::SqliteAvailabilityRepo,
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_parking_repo::SqliteParkingRepo,
        sqlite_payout_repo::SqlitePayoutRepo,
    },
    domain::models::auth::Claims,
    domain::ports::PaymentGateway,
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ISSUER: &str = "test-issuer";
pub const AUDIENCE: &str = "test-audience";
pub const WEBHOOK_SECRET: &str = "whsec_test";

#[derive(Default)]
pub struct MockPaymentGateway {
    pub fail_refunds: AtomicBool,
    pub refund_calls: AtomicUsize,
    pub checkout_calls: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout(&self, booking_id: &str, _amount_cents: i64, _currency: &str) -> Result<String, AppError> {
        self.checkout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://pay.test/checkout/{}", booking_id))
    }

    async fn issue_refund(&self, payment_reference: &str, _amount_cents: i64, _currency: &str) -> Result<String, AppError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("processor unavailable".into()));
        }
        Ok(format!("re_{}", payment_reference))
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub payments: Arc<MockPaymentGateway>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: ISSUER.to_string(),
            auth_audience: AUDIENCE.to_string(),
            payment_service_url: "http://localhost".to_string(),
            payment_service_token: "token".to_string(),
            payment_webhook_secret: WEBHOOK_SECRET.to_string(),
            payment_timeout_secs: 1,
            expiry_sweep_interval_secs: 3600,
            policy: BookingPolicy::default(),
        };

        let payments = Arc::new(MockPaymentGateway::default());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(SqliteParkingRepo::new(pool.clone())),
            Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            Arc::new(SqlitePayoutRepo::new(pool.clone())),
            payments.clone(),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            payments,
        }
    }

    /// Mints an access token for `user_id` with the test signing key.
    pub fn token(&self, user_id: &str) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            aud: AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
        };
        let key = EncodingKey::from_ed_pem(include_bytes!("../tests/keys/test_private.pem")).unwrap();
        encode(&Header::new(Algorithm::EdDSA), &claims, &key).unwrap()
    }

    pub async fn send(&self, method: &str, uri: &str, user_id: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user_id {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(b) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        parse(response).await
    }

    pub async fn webhook(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder().method("POST").uri(uri)
            .header("X-Webhook-Secret", WEBHOOK_SECRET)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        parse(response).await
    }

    /// Creates an active parking priced `price_hour_cents` per hour.
    pub async fn create_parking(&self, owner_id: &str, price_hour_cents: i64) -> String {
        let (status, body) = self.send("POST", "/api/v1/parkings", Some(owner_id), Some(json!({
            "title": "Garage Seefeld",
            "address_line": "Seefeldstrasse 1",
            "postal_code": "8008",
            "city": "Zurich",
            "parking_type": "garage",
            "is_covered": true,
            "price_hour_cents": price_hour_cents,
            "currency": "CHF"
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "create parking failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn confirm(&self, booking_id: &str, reference: &str) -> (StatusCode, Value) {
        self.webhook(
            &format!("/api/v1/bookings/{}/confirm-payment", booking_id),
            json!({ "payment_reference": reference }),
        ).await
    }

    pub fn refund_calls(&self) -> usize {
        self.payments.refund_calls.load(Ordering::SeqCst)
    }
}

pub async fn parse(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, body)
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
