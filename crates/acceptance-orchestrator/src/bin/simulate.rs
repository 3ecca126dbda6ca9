//! Sandbox walk-through against a running orchestrator.
//!
//! Plays the POS and the PSP: creates intents, fires confirmation webhooks
//! (including a duplicate) and prints what the status endpoint reports.

use std::time::Duration;

use acceptance::Amount;
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ORCHESTRATOR_URL: &str = "http://localhost:8080";

#[derive(Debug, thiserror::Error)]
enum SimError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

struct Simulator {
    client: reqwest::Client,
    base_url: String,
}

impl Simulator {
    fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn is_up(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn create_payment_intent(
        &self,
        merchant_id: &str,
        value: Decimal,
        currency: &str,
    ) -> Result<String, SimError> {
        let resp = self
            .client
            .post(format!("{}/api/v1/payment_intents", self.base_url))
            .json(&serde_json::json!({
                "merchantId": merchant_id,
                "amount": Amount::new(value, currency),
            }))
            .send()
            .await?;
        let body: serde_json::Value = resp.json().await?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SimError::Unexpected(body.to_string()))
    }

    async fn fire_psp_webhook(
        &self,
        event_id: &str,
        intent_id: &str,
        value: Decimal,
        currency: &str,
    ) -> Result<serde_json::Value, SimError> {
        let resp = self
            .client
            .post(format!("{}/webhooks/psp", self.base_url))
            .json(&serde_json::json!({
                "type": "FIAT_CONFIRMATION",
                "eventId": event_id,
                "relatedPaymentIntentId": intent_id,
                "source": "stripe_sandbox",
                "status": "CAPTURED",
                "settledAmount": Amount::new(value, currency),
                "effectiveTime": chrono::Utc::now(),
            }))
            .send()
            .await?;
        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        if !status.is_success() {
            tracing::warn!(%status, %body, "webhook not accepted");
        }
        Ok(body)
    }

    async fn check_status(&self, intent_id: &str) -> Result<(), SimError> {
        let body = self
            .client
            .get(format!("{}/api/v1/status", self.base_url))
            .query(&[("id", intent_id)])
            .send()
            .await?
            .text()
            .await?;
        tracing::info!("   > CLIENT check: {body}");
        Ok(())
    }
}

async fn run(sim: &Simulator) -> Result<(), SimError> {
    let coffee = Decimal::new(550, 2);

    tracing::info!("SCENARIO 1: normal transaction (coffee at Cafe Roma)");
    let payment_id = sim
        .create_payment_intent("merchant_cafe_roma_001", coffee, "EUR")
        .await?;
    tracing::info!("   > POS: created payment intent {payment_id}");
    tokio::time::sleep(Duration::from_millis(500)).await;

    let ack = sim
        .fire_psp_webhook("evt_stripe_real_123", &payment_id, coffee, "EUR")
        .await?;
    tracing::info!("   > PSP: webhook fired for {payment_id}: {ack}");
    tokio::time::sleep(Duration::from_millis(200)).await;
    sim.check_status(&payment_id).await?;

    tracing::info!("SCENARIO 2: duplicate webhook delivery");
    let ack = sim
        .fire_psp_webhook("evt_stripe_real_123", &payment_id, coffee, "EUR")
        .await?;
    tracing::info!("   > PSP: redelivered evt_stripe_real_123: {ack}");
    if ack["outcome"] != "already_processed" {
        tracing::warn!("   > duplicate was not reported as already processed");
    }

    tracing::info!("SCENARIO 3: large transaction");
    let big = Decimal::from(50_000);
    let big_id = sim
        .create_payment_intent("merchant_luxury_auto", big, "EUR")
        .await?;
    let ack = sim
        .fire_psp_webhook("evt_stripe_big_999", &big_id, big, "EUR")
        .await?;
    tracing::info!("   > PSP: webhook fired for {big_id}: {ack}");
    sim.check_status(&big_id).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url =
        std::env::var("ORCHESTRATOR_URL").unwrap_or_else(|_| DEFAULT_ORCHESTRATOR_URL.to_string());
    let sim = Simulator::new(base_url);

    tracing::info!("Starting end-to-end sandbox simulation against {}", sim.base_url);
    if !sim.is_up().await {
        tracing::error!("Orchestrator is not reachable at {}; start it first", sim.base_url);
        std::process::exit(1);
    }

    if let Err(e) = run(&sim).await {
        tracing::error!("Simulation aborted: {e}");
        std::process::exit(1);
    }
    tracing::info!("Simulation complete. Check the server logs for mock LP settlements.");
}
