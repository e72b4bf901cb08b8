//! Outbound value transfer
//!
//! The ledger never moves value itself. A withdrawal debits the account and
//! then asks a [`ValueTransferSink`] to deliver the amount to the caller.
//! Any error returned here fails the withdrawal and rolls the debit back.

pub mod memory;

use crate::types::{AccountId, Amount};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use memory::InMemorySink;

/// Failure reported by a transfer sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransferError {
    /// Human readable summary
    pub message: String,

    /// Opaque low-level diagnostics (return data, rail error codes)
    pub data: Bytes,
}

impl TransferError {
    /// Create an error with no diagnostic payload
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: Bytes::new(),
        }
    }

    /// Attach raw diagnostic bytes
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }
}

/// Capability that moves value out of the ledger
#[async_trait]
pub trait ValueTransferSink: Send + Sync {
    /// Deliver `amount` to `recipient`
    async fn send(&self, recipient: &AccountId, amount: Amount) -> Result<(), TransferError>;
}
