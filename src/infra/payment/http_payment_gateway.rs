use std::time::Duration;
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

pub struct HttpPaymentGateway {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Payment client setup failed: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<P: Serialize + Sync, R: for<'de> Deserialize<'de>>(&self, path: &str, payload: &P) -> Result<R, AppError> {
        let res = self.client.post(format!("{}{}", self.api_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment service connection error: {}", e);
                error!("{}", msg);
                AppError::Upstream(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Payment service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::Upstream(msg));
        }

        res.json::<R>().await.map_err(|e| AppError::Upstream(format!("Unreadable payment service response: {}", e)))
    }
}

#[derive(Serialize)]
struct CheckoutPayload<'a> {
    booking_id: &'a str,
    amount_cents: i64,
    currency: &'a str,
}

#[derive(Deserialize)]
struct CheckoutResponse {
    redirect_url: String,
}

#[derive(Serialize)]
struct RefundPayload<'a> {
    payment_reference: &'a str,
    amount_cents: i64,
    currency: &'a str,
}

#[derive(Deserialize)]
struct RefundResponse {
    refund_id: String,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout(&self, booking_id: &str, amount_cents: i64, currency: &str) -> Result<String, AppError> {
        let payload = CheckoutPayload { booking_id, amount_cents, currency };
        let res: CheckoutResponse = self.post("/checkouts", &payload).await?;
        Ok(res.redirect_url)
    }

    async fn issue_refund(&self, payment_reference: &str, amount_cents: i64, currency: &str) -> Result<String, AppError> {
        let payload = RefundPayload { payment_reference, amount_cents, currency };
        let res: RefundResponse = self.post("/refunds", &payload).await?;
        Ok(res.refund_id)
    }
}
