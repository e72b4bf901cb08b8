//! Error types for the ledger

use crate::sink::TransferError;
use crate::types::Amount;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every variant rejects the whole operation; no partial effects survive.
#[derive(Error, Debug)]
pub enum Error {
    /// Requested amount is zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Deposit would push aggregate funds over the bank cap
    #[error("Bank cap exceeded: attempted total {attempted_total}, cap {cap}")]
    BankCapExceeded {
        /// Aggregate funds the deposit would have produced
        attempted_total: Amount,
        /// Configured bank cap
        cap: Amount,
    },

    /// Withdrawal exceeds the per-transaction cap
    #[error("Withdrawal over cap: requested {requested}, cap {cap}")]
    WithdrawOverCap {
        /// Requested amount
        requested: Amount,
        /// Configured withdraw cap
        cap: Amount,
    },

    /// Account balance cannot cover the withdrawal
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Current balance
        available: Amount,
        /// Requested amount
        requested: Amount,
    },

    /// External value transfer reported failure; the debit was rolled back
    #[error("Transfer failed: {details}")]
    TransferFailed {
        /// Diagnostics from the sink
        details: TransferError,
    },

    /// Value attached to an entry point that accepts none
    #[error("Entry point does not accept value (sent {value})")]
    NonPayable {
        /// Value carried by the call
        value: Amount,
    },

    /// Unrecognized payload carried alongside value
    #[error("Unexpected payload of {len} bytes with value {value}")]
    UnexpectedPayload {
        /// Payload length
        len: usize,
        /// Value carried by the call
        value: Amount,
    },

    /// Invariant violation (funds accounting, bank cap)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label used for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            Error::ZeroAmount => "zero_amount",
            Error::BankCapExceeded { .. } => "bank_cap_exceeded",
            Error::WithdrawOverCap { .. } => "withdraw_over_cap",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::TransferFailed { .. } => "transfer_failed",
            Error::NonPayable { .. } => "non_payable",
            Error::UnexpectedPayload { .. } => "unexpected_payload",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Metrics(_) => "metrics",
            Error::Serialization(_) => "serialization",
            Error::Io(_) => "io",
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_amounts() {
        let err = Error::BankCapExceeded {
            attempted_total: 11,
            cap: 10,
        };
        assert_eq!(
            err.to_string(),
            "Bank cap exceeded: attempted total 11, cap 10"
        );
        assert_eq!(err.reason(), "bank_cap_exceeded");
    }

    #[test]
    fn test_transfer_failure_wraps_details() {
        let err = Error::TransferFailed {
            details: TransferError::new("recipient rejected"),
        };
        assert!(err.to_string().contains("recipient rejected"));
    }
}
