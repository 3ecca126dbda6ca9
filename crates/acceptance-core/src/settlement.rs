use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// On-chain destination of a payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecipient {
    #[serde(rename = "walletChain")]
    pub chain: String,
    #[serde(rename = "walletAddress")]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Directive sent to the liquidity provider. Built fresh on every dispatch
/// attempt and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementInstruction {
    pub instruction_id: String,
    pub trigger_event_id: String,
    pub recipient: WalletRecipient,
    pub payout: PayoutDetails,
    pub deadline: DateTime<Utc>,
}

/// What the liquidity provider reports back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    pub instruction_id: String,
    /// Transaction reference on the payout chain.
    pub transaction: String,
}

/// Successful result of processing a confirmation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// This call dispatched the payout and committed the intent as settled.
    Settled {
        #[serde(rename = "instructionId")]
        instruction_id: String,
        transaction: String,
    },
    /// The event was already processed; nothing happened.
    AlreadyProcessed,
    /// Another delivery of the same event holds the claim.
    InFlight,
    /// The intent was settled by an earlier event.
    AlreadySettled,
}

impl ProcessOutcome {
    /// Whether this call triggered a payout.
    pub fn dispatched(&self) -> bool {
        matches!(self, ProcessOutcome::Settled { .. })
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Settled { .. } => "settled",
            ProcessOutcome::AlreadyProcessed => "already_processed",
            ProcessOutcome::InFlight => "in_flight",
            ProcessOutcome::AlreadySettled => "already_settled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_uses_wallet_field_names() {
        let instruction = SettlementInstruction {
            instruction_id: "instr_1".to_string(),
            trigger_event_id: "evt_1".to_string(),
            recipient: WalletRecipient {
                chain: "world_chain".to_string(),
                address: "0xabc".to_string(),
            },
            payout: PayoutDetails {
                asset: "USDC".to_string(),
                amount: "5.94".parse().unwrap(),
            },
            deadline: Utc::now(),
        };
        let json = serde_json::to_value(&instruction).unwrap();
        assert_eq!(json["triggerEventId"], "evt_1");
        assert_eq!(json["recipient"]["walletChain"], "world_chain");
        assert_eq!(json["recipient"]["walletAddress"], "0xabc");
        assert_eq!(json["payout"]["amount"], 5.94);
    }

    #[test]
    fn outcome_is_tagged() {
        let settled = ProcessOutcome::Settled {
            instruction_id: "instr_1".to_string(),
            transaction: "0xmock".to_string(),
        };
        let json = serde_json::to_value(&settled).unwrap();
        assert_eq!(json["outcome"], "settled");
        assert_eq!(json["instructionId"], "instr_1");
        assert!(settled.dispatched());

        let json = serde_json::to_value(ProcessOutcome::AlreadyProcessed).unwrap();
        assert_eq!(json["outcome"], "already_processed");
        assert!(!ProcessOutcome::InFlight.dispatched());
    }
}
