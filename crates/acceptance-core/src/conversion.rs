//! Fiat to payout-asset conversion.
//!
//! The processor never assumes a 1:1 peg: every currency needs an explicit
//! rate, and currencies without one are rejected before anything is dispatched.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::{PAYOUT_ASSET, PAYOUT_DECIMALS};
use crate::error::AcceptanceError;
use crate::payment::Amount;
use crate::settlement::PayoutDetails;

/// Converts a confirmed fiat amount into the payout the liquidity provider sends.
pub trait ConversionPolicy: Send + Sync {
    fn convert(&self, amount: &Amount) -> Result<PayoutDetails, AcceptanceError>;
}

/// Fixed table of `currency -> payout units per 1 unit of currency`.
///
/// Results are truncated (never rounded up) to the payout asset's precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRateTable {
    asset: String,
    decimals: u32,
    rates: BTreeMap<String, Decimal>,
}

impl StaticRateTable {
    /// Empty table for the given asset. Every currency must be added explicitly.
    pub fn new(asset: impl Into<String>, decimals: u32) -> Self {
        Self {
            asset: asset.into(),
            decimals,
            rates: BTreeMap::new(),
        }
    }

    /// USD and USDC at parity, nothing else.
    pub fn usd_pegged() -> Self {
        Self::new(PAYOUT_ASSET, PAYOUT_DECIMALS)
            .with_rate("USD", Decimal::ONE)
            .with_rate("USDC", Decimal::ONE)
    }

    pub fn with_rate(mut self, currency: &str, rate: Decimal) -> Self {
        self.rates.insert(currency.trim().to_ascii_uppercase(), rate);
        self
    }

    pub fn with_rates(self, rates: impl IntoIterator<Item = (String, Decimal)>) -> Self {
        rates
            .into_iter()
            .fold(self, |table, (currency, rate)| table.with_rate(&currency, rate))
    }

    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(&currency.trim().to_ascii_uppercase()).copied()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.rates.keys().map(String::as_str)
    }
}

impl Default for StaticRateTable {
    /// USD/USDC at parity plus sandbox EUR and GBP reference rates.
    fn default() -> Self {
        Self::usd_pegged()
            .with_rate("EUR", Decimal::new(108, 2))
            .with_rate("GBP", Decimal::new(127, 2))
    }
}

impl ConversionPolicy for StaticRateTable {
    fn convert(&self, amount: &Amount) -> Result<PayoutDetails, AcceptanceError> {
        amount.validate()?;
        let currency = amount.currency_code();
        let rate = self
            .rates
            .get(&currency)
            .copied()
            .ok_or(AcceptanceError::UnsupportedCurrency(currency))?;

        let payout = amount
            .value
            .checked_mul(rate)
            .ok_or_else(|| AcceptanceError::Validation(format!("payout overflow for {amount}")))?
            .round_dp_with_strategy(self.decimals, RoundingStrategy::ToZero);

        if payout <= Decimal::ZERO {
            return Err(AcceptanceError::Validation(format!(
                "{amount} converts to a zero {} payout",
                self.asset
            )));
        }

        Ok(PayoutDetails {
            asset: self.asset.clone(),
            amount: payout,
        })
    }
}

/// Parse `"EUR=1.08,GBP=1.27"` into `(currency, rate)` pairs.
pub fn parse_rates(spec: &str) -> Result<Vec<(String, Decimal)>, AcceptanceError> {
    spec.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (currency, rate) = pair.split_once('=').ok_or_else(|| {
                AcceptanceError::ConfigError(format!("expected CURRENCY=RATE, got '{pair}'"))
            })?;
            let currency = currency.trim().to_ascii_uppercase();
            if currency.is_empty() {
                return Err(AcceptanceError::ConfigError(format!(
                    "missing currency in '{pair}'"
                )));
            }
            let rate: Decimal = rate.trim().parse().map_err(|e| {
                AcceptanceError::ConfigError(format!("invalid rate for {currency}: {e}"))
            })?;
            if rate <= Decimal::ZERO {
                return Err(AcceptanceError::ConfigError(format!(
                    "rate for {currency} must be positive"
                )));
            }
            Ok((currency, rate))
        })
        .collect()
}
