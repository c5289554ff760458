use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use crate::domain::models::booking::{Booking, PaymentStatus};
use crate::domain::models::payout::Payout;

/// Revenue recognized for one paid booking.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsEntry {
    pub booking_id: String,
    pub month: String,
    pub gross: Decimal,
    pub owner_net: Decimal,
    pub currency: String,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wallet {
    #[serde(with = "rust_decimal::serde::float")]
    pub pending: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub available: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid_out: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEarnings {
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Owner share of `gross`, rounded to cents.
pub fn owner_net(gross: Decimal, platform_fee_rate: Decimal) -> Decimal {
    (gross * (Decimal::ONE - platform_fee_rate)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Builds ledger entries for the bookings that count as earnings: paid and
/// not cancelled, in `currency`.
pub fn earnings_entries(bookings: &[Booking], platform_fee_rate: Decimal, currency: &str) -> Vec<EarningsEntry> {
    bookings
        .iter()
        .filter(|b| b.payment_status == PaymentStatus::Paid && !b.is_cancelled() && b.currency == currency)
        .map(|b| {
            let gross = cents_to_decimal(b.total_price_cents);
            EarningsEntry {
                booking_id: b.id.clone(),
                month: b.start_time.format("%Y-%m").to_string(),
                gross,
                owner_net: owner_net(gross, platform_fee_rate),
                currency: b.currency.clone(),
                end_time: b.end_time,
            }
        })
        .collect()
}

/// Funds clear once the stay has ended. Cleared funds not yet paid out are
/// available; the rest of the owner net is pending.
pub fn build_wallet(entries: &[EarningsEntry], payouts: &[Payout], now: DateTime<Utc>, currency: &str) -> Wallet {
    let (cleared, pending) = entries.iter().fold((Decimal::ZERO, Decimal::ZERO), |(cleared, pending), e| {
        if e.end_time <= now {
            (cleared + e.owner_net, pending)
        } else {
            (cleared, pending + e.owner_net)
        }
    });

    let paid_out: Decimal = payouts
        .iter()
        .filter(|p| p.currency == currency)
        .map(|p| cents_to_decimal(p.amount_cents))
        .sum();

    Wallet {
        pending,
        available: (cleared - paid_out).max(Decimal::ZERO),
        paid_out,
        total: cleared + pending,
        currency: currency.to_string(),
    }
}

/// Owner net per month of booking start, oldest month first.
pub fn monthly_rollup(entries: &[EarningsEntry]) -> Vec<MonthlyEarnings> {
    let mut by_month: BTreeMap<&str, Decimal> = BTreeMap::new();
    for e in entries {
        *by_month.entry(e.month.as_str()).or_insert(Decimal::ZERO) += e.owner_net;
    }
    by_month
        .into_iter()
        .map(|(month, total)| MonthlyEarnings { month: month.to_string(), total })
        .collect()
}
