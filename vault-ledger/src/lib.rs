//! Vault Ledger
//!
//! Custodial ledger of per-account balances with two fixed policy limits:
//! a ceiling on aggregate funds and a ceiling on any single withdrawal.
//!
//! # Architecture
//!
//! - **Single Writer**: One actor task owns all account state, so every
//!   operation is serialized, including its outbound transfer
//! - **Checks, Effects, Interactions**: Guards run first, state is mutated
//!   second, value leaves through a [`ValueTransferSink`] last
//! - **Rollback**: A failed transfer restores the debited vault and totals
//! - **Notifications**: Completed operations are broadcast as [`LedgerEvent`]s
//!
//! # Invariants
//!
//! - `total_funds == Σ(balance)` after every operation
//! - `total_funds <= bank_cap`
//! - Every withdrawal `<= withdraw_cap`
//! - Zero-value requests never mutate state
//! - Limits never change after initialization

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod sink;
pub mod state;
pub mod types;
pub mod validation;

// Re-exports
pub use config::Config;
pub use dispatch::{Call, CallOutcome, Instruction};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use sink::{InMemorySink, TransferError, ValueTransferSink};
pub use types::{AccountId, Amount, EventKind, LedgerEvent, Limits, Totals, Vault};
