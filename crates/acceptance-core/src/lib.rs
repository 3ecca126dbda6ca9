//! Settlement orchestration for fiat-funded payment intents.
//!
//! A merchant creates a [`PaymentIntent`]; the payment-service-provider later
//! delivers a [`FiatConfirmationEvent`] by webhook. The
//! [`ConfirmationProcessor`] turns each confirmed intent into exactly one
//! [`SettlementInstruction`] for the liquidity provider, no matter how many
//! times (or how concurrently) the PSP redelivers the event.
//!
//! # Capabilities
//!
//! - [`Ledger`] - intents plus the processed-event table with an atomic claim
//! - [`LiquidityGateway`] - executes a settlement instruction (slow, fallible)
//! - [`NotificationSink`] - fire-and-forget receipt delivery
//! - [`ConversionPolicy`] - fiat amount to payout asset amount
//! - [`WalletDirectory`] - merchant to on-chain recipient
//!
//! # Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//! use acceptance::{
//!     Amount, ConfirmationProcessor, InMemoryLedger, Ledger, MockLiquidityProvider, PaymentIntent,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let ledger = Arc::new(InMemoryLedger::new());
//! let intent = PaymentIntent::new("m1", Amount::new("5.50".parse().unwrap(), "EUR"));
//! ledger.save_payment_intent(intent.clone());
//!
//! let processor = ConfirmationProcessor::new(ledger, MockLiquidityProvider::default());
//! # }
//! ```

pub mod constants;
pub mod conversion;
pub mod error;
pub mod hmac;
pub mod ledger;
pub mod liquidity;
pub mod notify;
pub mod payment;
pub mod processor;
pub mod settlement;
pub mod wallet;

pub use constants::*;
pub use conversion::{ConversionPolicy, StaticRateTable};
pub use error::AcceptanceError;
pub use ledger::{InMemoryLedger, Ledger};
pub use liquidity::{HttpLiquidityGateway, LiquidityBackend, LiquidityGateway, MockLiquidityProvider};
pub use notify::{LogNotifier, NotificationSink, WebhookNotifier};
pub use payment::*;
pub use processor::ConfirmationProcessor;
pub use settlement::*;
pub use wallet::{StaticWalletDirectory, WalletDirectory};
