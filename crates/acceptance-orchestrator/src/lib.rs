//! Acceptance orchestrator: the HTTP face of the settlement pipeline.
//!
//! Merchants create payment intents, the PSP posts fiat confirmations to
//! `/webhooks/psp`, and the [`acceptance::ConfirmationProcessor`] settles each
//! confirmed intent exactly once through the configured liquidity provider.
//!
//! # Modules
//!
//! - [`routes`] - HTTP endpoints (payment intents, PSP webhook, status, health, metrics)
//! - [`state`] - Shared [`AppState`](state::AppState), wired from [`config`]
//! - [`config`] - Environment configuration
//! - [`metrics`] - Prometheus metrics for confirmations and intents

pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
