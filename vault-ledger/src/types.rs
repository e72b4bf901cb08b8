//! Core types for the ledger
//!
//! All types are designed for:
//! - Exact arithmetic (unsigned integers in the smallest value unit)
//! - Cheap copies for snapshot/restore around external transfers
//! - Deterministic serialization (bincode, serde_json for observers)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Amount of value in the smallest indivisible unit
pub type Amount = u128;

/// Account identifier (opaque address-like key)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Per-account record of balance and operation counters
///
/// An account that was never touched reads as `Vault::default()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Current balance
    pub balance: Amount,

    /// Number of successful deposits
    pub deposit_count: u64,

    /// Number of successful withdrawals
    pub withdraw_count: u64,
}

/// Policy limits, fixed when the ledger is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Ceiling on aggregate funds across all accounts
    pub bank_cap: Amount,

    /// Ceiling on the amount moved by a single withdrawal
    pub withdraw_cap: Amount,
}

impl Limits {
    /// Create limits
    pub fn new(bank_cap: Amount, withdraw_cap: Amount) -> Self {
        Self {
            bank_cap,
            withdraw_cap,
        }
    }
}

/// Global running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of all account balances
    pub total_funds: Amount,

    /// Successful deposits across all accounts
    pub total_deposits: u64,

    /// Successful withdrawals across all accounts
    pub total_withdrawals: u64,
}

/// Kind of completed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventKind {
    /// Value credited to an account
    Deposited = 1,
    /// Value debited and sent out
    Withdrawn = 2,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Deposited => write!(f, "Deposited"),
            EventKind::Withdrawn => write!(f, "Withdrawn"),
        }
    }
}

/// Notification emitted after an operation completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique event ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// What happened
    pub kind: EventKind,

    /// Account the operation applied to
    pub account: AccountId,

    /// Amount moved
    pub amount: Amount,

    /// Account balance after the operation
    pub new_balance: Amount,

    /// When the operation completed
    pub timestamp: DateTime<Utc>,
}

impl LedgerEvent {
    /// Create a new event stamped with the current time
    pub fn new(kind: EventKind, account: AccountId, amount: Amount, new_balance: Amount) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            account,
            amount,
            new_balance,
            timestamp: Utc::now(),
        }
    }
}
