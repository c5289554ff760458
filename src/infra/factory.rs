use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::infra::payment::http_payment_gateway::HttpPaymentGateway;
use crate::infra::repositories::{
    postgres_availability_repo::PostgresAvailabilityRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_parking_repo::PostgresParkingRepo, postgres_payout_repo::PostgresPayoutRepo,
    sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_parking_repo::SqliteParkingRepo, sqlite_payout_repo::SqlitePayoutRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let payment_gateway = Arc::new(
        HttpPaymentGateway::new(
            config.payment_service_url.clone(),
            config.payment_service_token.clone(),
            Duration::from_secs(config.payment_timeout_secs),
        )
        .expect("Failed to build payment client"),
    );

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        AppState::new(
            config.clone(),
            Arc::new(PostgresParkingRepo::new(pool.clone())),
            Arc::new(PostgresAvailabilityRepo::new(pool.clone())),
            Arc::new(PostgresBookingRepo::new(pool.clone())),
            Arc::new(PostgresPayoutRepo::new(pool.clone())),
            payment_gateway,
        )
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        AppState::new(
            config.clone(),
            Arc::new(SqliteParkingRepo::new(pool.clone())),
            Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            Arc::new(SqlitePayoutRepo::new(pool.clone())),
            payment_gateway,
        )
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
