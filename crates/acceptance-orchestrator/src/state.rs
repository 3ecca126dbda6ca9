use std::sync::Arc;

use acceptance::hmac::derive_key;
use acceptance::notify::validate_webhook_urls;
use acceptance::{
    ConfirmationProcessor, HttpLiquidityGateway, InMemoryLedger, Ledger, LiquidityBackend,
    LogNotifier, MockLiquidityProvider, WebhookNotifier,
};

use crate::config::{ConfigError, LpMode, OrchestratorConfig};

/// Shared application state for the orchestrator server.
pub struct AppState<G> {
    pub processor: ConfirmationProcessor<G>,
    /// Bearer token for /metrics.
    pub metrics_token: Option<Vec<u8>>,
    pub public_metrics: bool,
}

impl<G> AppState<G> {
    pub fn new(processor: ConfirmationProcessor<G>) -> Self {
        Self {
            processor,
            metrics_token: None,
            public_metrics: false,
        }
    }

    pub fn with_metrics_token(mut self, token: impl Into<Vec<u8>>) -> Self {
        self.metrics_token = Some(token.into());
        self
    }

    pub fn with_public_metrics(mut self, public: bool) -> Self {
        self.public_metrics = public;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        self.processor.ledger()
    }
}

impl AppState<LiquidityBackend> {
    /// Wire the ledger, liquidity provider, wallets, rates and notifiers from config.
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, ConfigError> {
        let ledger: Arc<dyn Ledger> = Arc::new(InMemoryLedger::new());

        let gateway = match (config.lp_mode, &config.lp_node_url) {
            (LpMode::Http, Some(url)) => LiquidityBackend::Http(
                HttpLiquidityGateway::new(url, config.lp_api_key.clone())
                    .map_err(|_| ConfigError::InvalidUrl(url.clone()))?,
            ),
            (LpMode::Http, None) => return Err(ConfigError::MissingRequired("LP_NODE_URL")),
            _ => LiquidityBackend::Mock(
                MockLiquidityProvider::new(config.lp_node_url.clone())
                    .with_delay(config.mock_lp_delay),
            ),
        };
        tracing::info!(backend = gateway.name(), "liquidity provider selected");

        let mut processor = ConfirmationProcessor::new(ledger, gateway)
            .with_conversion_policy(Arc::new(config.rates.clone()))
            .with_wallet_directory(Arc::new(config.wallets.clone()))
            .with_dispatch_timeout(config.dispatch_timeout)
            .with_notifier(Arc::new(LogNotifier));

        if !config.receipt_webhook_urls.is_empty() {
            tracing::info!(
                count = config.receipt_webhook_urls.len(),
                "receipt webhook URLs configured"
            );
            validate_webhook_urls(&config.receipt_webhook_urls);
            let mut webhooks =
                WebhookNotifier::new(reqwest::Client::new(), config.receipt_webhook_urls.clone());
            if let Some(secret) = &config.receipt_webhook_secret {
                webhooks = webhooks.with_hmac_key(derive_key(secret.as_bytes(), "receipt-webhook"));
            }
            processor = processor.with_notifier(Arc::new(webhooks));
        }

        let mut state = Self::new(processor).with_public_metrics(config.public_metrics);
        if let Some(token) = &config.metrics_token {
            state = state.with_metrics_token(token.as_bytes());
        }
        Ok(state)
    }
}
