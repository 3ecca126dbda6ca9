use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::constants::DEFAULT_PAYOUT_CHAIN;
use crate::error::AcceptanceError;
use crate::settlement::WalletRecipient;

/// Resolves the wallet a merchant is paid out to.
pub trait WalletDirectory: Send + Sync {
    fn resolve_recipient(&self, merchant_id: &str) -> Result<WalletRecipient, AcceptanceError>;
}

/// Wallets configured at startup, with an optional catch-all address.
#[derive(Debug, Clone)]
pub struct StaticWalletDirectory {
    chain: String,
    wallets: HashMap<String, Address>,
    fallback: Option<Address>,
}

impl StaticWalletDirectory {
    pub fn new(chain: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            wallets: HashMap::new(),
            fallback: None,
        }
    }

    pub fn with_wallet(
        mut self,
        merchant_id: impl Into<String>,
        address: &str,
    ) -> Result<Self, AcceptanceError> {
        self.wallets
            .insert(merchant_id.into(), parse_address(address)?);
        Ok(self)
    }

    /// Address used for merchants without a wallet of their own.
    pub fn with_fallback(mut self, address: &str) -> Result<Self, AcceptanceError> {
        self.fallback = Some(parse_address(address)?);
        Ok(self)
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }
}

impl Default for StaticWalletDirectory {
    /// `world_chain` with no wallets and no fallback.
    fn default() -> Self {
        Self::new(DEFAULT_PAYOUT_CHAIN)
    }
}

impl WalletDirectory for StaticWalletDirectory {
    fn resolve_recipient(&self, merchant_id: &str) -> Result<WalletRecipient, AcceptanceError> {
        let address = self
            .wallets
            .get(merchant_id)
            .or(self.fallback.as_ref())
            .ok_or_else(|| AcceptanceError::WalletNotFound(merchant_id.to_string()))?;
        Ok(WalletRecipient {
            chain: self.chain.clone(),
            address: address.to_checksum(None),
        })
    }
}

fn parse_address(raw: &str) -> Result<Address, AcceptanceError> {
    let address = Address::from_str(raw.trim())
        .map_err(|e| AcceptanceError::ConfigError(format!("invalid wallet address '{raw}': {e}")))?;
    if address == Address::ZERO {
        return Err(AcceptanceError::ConfigError(
            "wallet address cannot be zero".to_string(),
        ));
    }
    Ok(address)
}

/// Parse `"merchant_a=0x...,merchant_b=0x..."` into `(merchant, address)` pairs.
/// Addresses are checked later, when they are added to a directory.
pub fn parse_wallets(spec: &str) -> Result<Vec<(String, String)>, AcceptanceError> {
    spec.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((merchant, address)) if !merchant.trim().is_empty() => {
                Ok((merchant.trim().to_string(), address.trim().to_string()))
            }
            _ => Err(AcceptanceError::ConfigError(format!(
                "expected MERCHANT=ADDRESS, got '{pair}'"
            ))),
        })
        .collect()
}
