//! Liquidity provider adapters.
//!
//! A gateway call can be slow (chain confirmation) and can fail (insufficient
//! liquidity, network partition, bad recipient). Callers treat any error as
//! "nothing happened" and rely on webhook redelivery for retries.

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::constants::DEFAULT_MOCK_DELAY;
use crate::error::AcceptanceError;
use crate::settlement::{SettlementInstruction, SettlementReceipt};

/// Executes settlement instructions. The instruction is handed over for the
/// duration of the call.
pub trait LiquidityGateway: Send + Sync {
    fn request_settlement(
        &self,
        instruction: SettlementInstruction,
    ) -> impl Future<Output = Result<SettlementReceipt, AcceptanceError>> + Send;
}

/// Sandbox provider: logs the payout, waits out a fake confirmation delay and
/// returns a mock transaction hash.
#[derive(Debug, Clone)]
pub struct MockLiquidityProvider {
    node_url: Option<String>,
    delay: Duration,
    max_payout: Option<Decimal>,
}

impl MockLiquidityProvider {
    pub fn new(node_url: Option<String>) -> Self {
        Self {
            node_url,
            delay: DEFAULT_MOCK_DELAY,
            max_payout: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject payouts above `max`, simulating exhausted liquidity.
    pub fn with_max_payout(mut self, max: Decimal) -> Self {
        self.max_payout = Some(max);
        self
    }
}

impl Default for MockLiquidityProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LiquidityGateway for MockLiquidityProvider {
    async fn request_settlement(
        &self,
        instruction: SettlementInstruction,
    ) -> Result<SettlementReceipt, AcceptanceError> {
        tracing::info!(
            node = self.node_url.as_deref().unwrap_or("sandbox"),
            instruction_id = %instruction.instruction_id,
            amount = %instruction.payout.amount,
            asset = %instruction.payout.asset,
            recipient = %instruction.recipient.address,
            chain = %instruction.recipient.chain,
            "mock LP: settlement triggered"
        );

        if let Some(max) = self.max_payout {
            if instruction.payout.amount > max {
                return Err(AcceptanceError::Dispatch(format!(
                    "insufficient liquidity: payout {} {} exceeds available {max}",
                    instruction.payout.amount, instruction.payout.asset
                )));
            }
        }

        tokio::time::sleep(self.delay).await;

        let transaction = format!("0xmock_{}", instruction.instruction_id);
        tracing::info!(tx = %transaction, "mock LP: transaction confirmed");
        Ok(SettlementReceipt {
            instruction_id: instruction.instruction_id,
            transaction,
        })
    }
}

/// Liquidity node reached over HTTP: `POST {base}/v1/settlements` with the
/// instruction as JSON and an optional bearer API key.
#[derive(Debug, Clone)]
pub struct HttpLiquidityGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLiquidityGateway {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AcceptanceError> {
        url::Url::parse(base_url)
            .map_err(|e| AcceptanceError::ConfigError(format!("invalid LP node URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AcceptanceError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn settlements_url(&self) -> String {
        format!("{}/v1/settlements", self.base_url)
    }
}

impl LiquidityGateway for HttpLiquidityGateway {
    async fn request_settlement(
        &self,
        instruction: SettlementInstruction,
    ) -> Result<SettlementReceipt, AcceptanceError> {
        let mut request = self.client.post(self.settlements_url()).json(&instruction);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AcceptanceError::Dispatch(format!("liquidity node unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AcceptanceError::Dispatch(format!(
                "liquidity node rejected instruction {} ({status}): {}",
                instruction.instruction_id,
                body.trim()
            )));
        }

        resp.json::<SettlementReceipt>()
            .await
            .map_err(|e| AcceptanceError::Dispatch(format!("liquidity node response parse failed: {e}")))
    }
}

/// Runtime choice between the sandbox and HTTP providers.
#[derive(Debug, Clone)]
pub enum LiquidityBackend {
    Mock(MockLiquidityProvider),
    Http(HttpLiquidityGateway),
}

impl LiquidityBackend {
    pub fn name(&self) -> &'static str {
        match self {
            LiquidityBackend::Mock(_) => "mock",
            LiquidityBackend::Http(_) => "http",
        }
    }
}

impl LiquidityGateway for LiquidityBackend {
    async fn request_settlement(
        &self,
        instruction: SettlementInstruction,
    ) -> Result<SettlementReceipt, AcceptanceError> {
        match self {
            LiquidityBackend::Mock(lp) => lp.request_settlement(instruction).await,
            LiquidityBackend::Http(lp) => lp.request_settlement(instruction).await,
        }
    }
}
