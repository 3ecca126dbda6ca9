use std::time::Duration;

use thiserror::Error;

/// Errors returned by settlement orchestration.
///
/// Duplicate deliveries and already-settled intents are not errors; they are
/// reported as [`crate::ProcessOutcome`] variants.
#[derive(Debug, Error)]
pub enum AcceptanceError {
    #[error("payment intent not found: {0}")]
    IntentNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("no payout wallet on file for merchant {0}")]
    WalletNotFound(String),

    #[error("settlement request failed: {0}")]
    Dispatch(String),

    #[error("settlement request exceeded its deadline of {0:?}")]
    DispatchTimeout(Duration),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl AcceptanceError {
    /// Lookup misses (the `NotFound` class).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AcceptanceError::IntentNotFound(_) | AcceptanceError::WalletNotFound(_)
        )
    }

    /// Gateway rejections and timeouts. The event stays unprocessed and may be redelivered.
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(
            self,
            AcceptanceError::Dispatch(_) | AcceptanceError::DispatchTimeout(_)
        )
    }
}
