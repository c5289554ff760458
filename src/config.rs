use std::env;
use std::str::FromStr;
use chrono::Duration;
use rust_decimal::Decimal;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_public_key: String, // Identity provider public key (Ed25519 PEM)
    pub auth_issuer: String,
    pub auth_audience: String,
    pub payment_service_url: String,
    pub payment_service_token: String,
    pub payment_webhook_secret: String,
    pub payment_timeout_secs: u64,
    pub expiry_sweep_interval_secs: u64,
    pub policy: BookingPolicy,
}

/// Money and timing rules applied by the booking engine.
#[derive(Clone, Debug)]
pub struct BookingPolicy {
    pub pending_payment_ttl: Duration,
    pub renter_refund_cutoff: Duration,
    pub platform_fee_rate: Decimal,
    pub default_currency: String,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            pending_payment_ttl: Duration::minutes(10),
            renter_refund_cutoff: Duration::hours(24),
            platform_fee_rate: Decimal::new(15, 2),
            default_currency: "CHF".to_string(),
        }
    }
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| panic!("{} has an invalid value: {}", key, raw)),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = BookingPolicy::default();
        let policy = BookingPolicy {
            pending_payment_ttl: Duration::minutes(parsed_or("PENDING_PAYMENT_TTL_MINUTES", 10)),
            renter_refund_cutoff: Duration::hours(parsed_or("RENTER_REFUND_CUTOFF_HOURS", 24)),
            platform_fee_rate: parsed_or("PLATFORM_FEE_RATE", defaults.platform_fee_rate),
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or(defaults.default_currency),
        };

        if policy.platform_fee_rate < Decimal::ZERO || policy.platform_fee_rate > Decimal::ONE {
            panic!("PLATFORM_FEE_RATE must be between 0 and 1");
        }

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: parsed_or("PORT", 3000),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://auth.parking.local".to_string()),
            auth_audience: env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "parking-frontend".to_string()),
            payment_service_url: env::var("PAYMENT_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1".to_string()),
            payment_service_token: env::var("PAYMENT_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").expect("PAYMENT_WEBHOOK_SECRET must be set"),
            payment_timeout_secs: parsed_or("PAYMENT_TIMEOUT_SECS", 10),
            expiry_sweep_interval_secs: parsed_or("EXPIRY_SWEEP_INTERVAL_SECS", 30),
            policy,
        }
    }
}
