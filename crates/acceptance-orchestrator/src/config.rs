use std::env;
use std::time::Duration;

use acceptance::conversion::parse_rates;
use acceptance::wallet::parse_wallets;
use acceptance::{StaticRateTable, StaticWalletDirectory, DEFAULT_PAYOUT_CHAIN, SANDBOX_PAYOUT_ADDRESS};
use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RATE_LIMIT_RPM: u64 = 120;
const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MOCK_LP_DELAY_MS: u64 = 100;

/// Which liquidity provider the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpMode {
    /// HTTP when `LP_NODE_URL` is set, otherwise the sandbox mock.
    Auto,
    Mock,
    Http,
}

impl LpMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(LpMode::Auto),
            "mock" => Ok(LpMode::Mock),
            "http" => Ok(LpMode::Http),
            other => Err(ConfigError::InvalidValue {
                key: "LP_MODE",
                message: format!("expected auto, mock or http, got '{other}'"),
            }),
        }
    }
}

#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Server port
    pub port: u16,
    pub stripe_secret_key: Option<String>,
    /// Carried for PSP integration; inbound webhooks are not authenticated.
    pub stripe_webhook_secret: Option<String>,
    /// Liquidity node base URL
    pub lp_node_url: Option<String>,
    pub lp_api_key: Option<String>,
    pub chain_rpc_url: Option<String>,
    /// Resolved provider mode, never `Auto`.
    pub lp_mode: LpMode,
    pub dispatch_timeout: Duration,
    pub mock_lp_delay: Duration,
    pub wallets: StaticWalletDirectory,
    pub rates: StaticRateTable,
    /// Receipt webhook URLs
    pub receipt_webhook_urls: Vec<String>,
    pub receipt_webhook_secret: Option<String>,
    /// CORS allowed origins (empty = localhost only)
    pub allowed_origins: Vec<String>,
    pub rate_limit_rpm: u64,
    /// Bearer token required for /metrics
    pub metrics_token: Option<String>,
    /// Serve /metrics without a token when none is configured
    pub public_metrics: bool,
}

impl std::fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("port", &self.port)
            .field(
                "stripe_secret_key",
                &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "stripe_webhook_secret",
                &self.stripe_webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("lp_node_url", &self.lp_node_url)
            .field("lp_api_key", &self.lp_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("chain_rpc_url", &self.chain_rpc_url)
            .field("lp_mode", &self.lp_mode)
            .field("dispatch_timeout", &self.dispatch_timeout)
            .field("mock_lp_delay", &self.mock_lp_delay)
            .field("wallets", &self.wallets)
            .field("rates", &self.rates)
            .field("receipt_webhook_urls", &self.receipt_webhook_urls)
            .field(
                "receipt_webhook_secret",
                &self.receipt_webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("public_metrics", &self.public_metrics)
            .finish()
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_number(&get, "PORT", DEFAULT_PORT)?;

        // PSP and chain endpoints: all optional in the sandbox.
        let stripe_secret_key = get("STRIPE_SECRET_KEY");
        let stripe_webhook_secret = get("STRIPE_WEBHOOK_SECRET");
        let lp_node_url = get("LP_NODE_URL");
        let lp_api_key = get("LP_API_KEY");
        let chain_rpc_url = get("CHAIN_RPC_URL");

        for (key, value) in [
            ("STRIPE_SECRET_KEY", &stripe_secret_key),
            ("STRIPE_WEBHOOK_SECRET", &stripe_webhook_secret),
            ("LP_NODE_URL", &lp_node_url),
            ("LP_API_KEY", &lp_api_key),
            ("CHAIN_RPC_URL", &chain_rpc_url),
        ] {
            if value.is_none() {
                tracing::warn!("{key} not set, using sandbox default");
            }
        }

        for url in [&lp_node_url, &chain_rpc_url].into_iter().flatten() {
            Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        }

        let lp_mode = match LpMode::parse(&get("LP_MODE").unwrap_or_default())? {
            LpMode::Auto if lp_node_url.is_some() => LpMode::Http,
            LpMode::Auto => LpMode::Mock,
            LpMode::Http if lp_node_url.is_none() => {
                return Err(ConfigError::MissingRequired("LP_NODE_URL"));
            }
            mode => mode,
        };

        let dispatch_timeout = Duration::from_secs(parse_number(
            &get,
            "DISPATCH_TIMEOUT_SECS",
            DEFAULT_DISPATCH_TIMEOUT_SECS,
        )?);
        if dispatch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "DISPATCH_TIMEOUT_SECS",
                message: "must be greater than zero".to_string(),
            });
        }
        let mock_lp_delay = Duration::from_millis(parse_number(
            &get,
            "MOCK_LP_DELAY_MS",
            DEFAULT_MOCK_LP_DELAY_MS,
        )?);

        // Payout wallets. The sandbox pays every merchant to the stub address
        // unless a real fallback is configured.
        let mut wallets = StaticWalletDirectory::new(
            get("PAYOUT_CHAIN").unwrap_or_else(|| DEFAULT_PAYOUT_CHAIN.to_string()),
        );
        if let Some(spec) = get("MERCHANT_WALLETS") {
            let pairs = parse_wallets(&spec).map_err(|e| invalid("MERCHANT_WALLETS", e))?;
            for (merchant, address) in pairs {
                wallets = wallets
                    .with_wallet(merchant, &address)
                    .map_err(|e| invalid("MERCHANT_WALLETS", e))?;
            }
        }
        let fallback = get("DEFAULT_PAYOUT_ADDRESS").or_else(|| {
            (lp_mode == LpMode::Mock).then(|| SANDBOX_PAYOUT_ADDRESS.to_string())
        });
        if let Some(address) = fallback {
            wallets = wallets
                .with_fallback(&address)
                .map_err(|e| invalid("DEFAULT_PAYOUT_ADDRESS", e))?;
        }

        let mut rates = StaticRateTable::default();
        if let Some(spec) = get("FX_RATES") {
            rates = rates.with_rates(parse_rates(&spec).map_err(|e| invalid("FX_RATES", e))?);
        }

        let receipt_webhook_urls = get("RECEIPT_WEBHOOK_URLS")
            .map(|urls| split_list(&urls))
            .unwrap_or_default();
        for url in &receipt_webhook_urls {
            Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
        }
        let receipt_webhook_secret = get("RECEIPT_WEBHOOK_SECRET");

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|origins| split_list(&origins))
            .unwrap_or_default();
        if allowed_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::InvalidValue {
                key: "ALLOWED_ORIGINS",
                message: "wildcard origin '*' is not allowed; list origins explicitly".to_string(),
            });
        }

        let rate_limit_rpm = parse_number(&get, "RATE_LIMIT_RPM", DEFAULT_RATE_LIMIT_RPM)?;

        let metrics_token = get("METRICS_TOKEN");
        let public_metrics = get("PUBLIC_METRICS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        if metrics_token.is_none() && !public_metrics {
            tracing::warn!("METRICS_TOKEN not set, /metrics will answer 403 unless PUBLIC_METRICS=true");
        }

        Ok(Self {
            port,
            stripe_secret_key,
            stripe_webhook_secret,
            lp_node_url,
            lp_api_key,
            chain_rpc_url,
            lp_mode,
            dispatch_timeout,
            mock_lp_delay,
            wallets,
            rates,
            receipt_webhook_urls,
            receipt_webhook_secret,
            allowed_origins,
            rate_limit_rpm,
            metrics_token,
            public_metrics,
        })
    }
}

fn parse_number<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn invalid(key: &'static str, err: acceptance::AcceptanceError) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        message: err.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid number for {key}: '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}
