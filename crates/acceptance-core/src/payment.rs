use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::INTENT_ID_PREFIX;
use crate::error::AcceptanceError;

/// A fiat amount. `value` travels as a JSON number but is held as a decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }

    /// Upper-cased currency code used for rate lookups and comparisons.
    pub fn currency_code(&self) -> String {
        self.currency.trim().to_ascii_uppercase()
    }

    pub fn validate(&self) -> Result<(), AcceptanceError> {
        if self.currency.trim().is_empty() {
            return Err(AcceptanceError::Validation(
                "amount currency is required".to_string(),
            ));
        }
        if self.value <= Decimal::ZERO {
            return Err(AcceptanceError::Validation(format!(
                "amount must be positive, got {}",
                self.value
            )));
        }
        Ok(())
    }

    fn matches(&self, other: &Amount) -> bool {
        self.value == other.value && self.currency_code() == other.currency_code()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    Created,
    Funded,
    Settled,
    Failed,
}

impl IntentStatus {
    /// Only created or funded intents may be settled.
    pub fn is_settleable(self) -> bool {
        matches!(self, IntentStatus::Created | IntentStatus::Funded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntentStatus::Created => "CREATED",
            IntentStatus::Funded => "FUNDED",
            IntentStatus::Settled => "SETTLED",
            IntentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A merchant's request to receive a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub merchant_id: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub status: IntentStatus,
}

impl PaymentIntent {
    /// New intent in `CREATED` with a freshly generated `pi_` identifier.
    pub fn new(merchant_id: impl Into<String>, amount: Amount) -> Self {
        Self {
            id: generate_id(INTENT_ID_PREFIX),
            merchant_id: merchant_id.into(),
            amount,
            timestamp: Utc::now(),
            metadata: BTreeMap::new(),
            status: IntentStatus::Created,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Fiat-settlement confirmation delivered by the PSP webhook.
///
/// Everything in it is untrusted; `event_id` is only relied on for uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiatConfirmationEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    pub event_id: String,
    #[serde(rename = "relatedPaymentIntentId")]
    pub related_payment_intent: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: String,
    pub settled_amount: Amount,
    #[serde(default = "Utc::now")]
    pub effective_time: DateTime<Utc>,
}

impl FiatConfirmationEvent {
    /// Structural checks performed before the event reaches the processor.
    pub fn validate(&self) -> Result<(), AcceptanceError> {
        if self.event_id.trim().is_empty() {
            return Err(AcceptanceError::Validation("eventId is required".to_string()));
        }
        if self.related_payment_intent.trim().is_empty() {
            return Err(AcceptanceError::Validation(
                "relatedPaymentIntentId is required".to_string(),
            ));
        }
        self.settled_amount.validate()
    }

    /// Whether the confirmed amount differs from what the intent asked for.
    pub fn amount_differs_from(&self, intent: &PaymentIntent) -> bool {
        !self.settled_amount.matches(&intent.amount)
    }
}

/// Collision-resistant identifier, e.g. `pi_3f2a...`.
pub fn generate_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}
