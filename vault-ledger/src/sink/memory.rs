//! In-process transfer sink

use super::{TransferError, ValueTransferSink};
use crate::types::{AccountId, Amount};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Sink that credits recipients in process memory
///
/// Failures can be scripted with [`InMemorySink::fail_next`]; each scripted
/// error is consumed by exactly one `send`.
#[derive(Debug, Default)]
pub struct InMemorySink {
    latency: Option<Duration>,
    credited: DashMap<AccountId, Amount>,
    transfers: AtomicU64,
    scripted_failures: Mutex<VecDeque<TransferError>>,
}

impl InMemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency on every send
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `send` fail with `error`
    pub fn fail_next(&self, error: TransferError) {
        self.scripted_failures.lock().push_back(error);
    }

    /// Total value delivered to `recipient`
    pub fn credited(&self, recipient: &AccountId) -> Amount {
        self.credited.get(recipient).map(|v| *v).unwrap_or(0)
    }

    /// Total value delivered to everyone
    pub fn total_sent(&self) -> Amount {
        self.credited.iter().map(|entry| *entry.value()).sum()
    }

    /// Number of successful transfers
    pub fn transfer_count(&self) -> u64 {
        self.transfers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ValueTransferSink for InMemorySink {
    async fn send(&self, recipient: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.scripted_failures.lock().pop_front();
        if let Some(error) = scripted {
            warn!(%recipient, amount, "In-memory sink: scripted transfer failure");
            return Err(error);
        }

        // Nothing is recorded for a recipient until a send succeeds
        let entry = self.credited.entry(recipient.clone());
        let current = match &entry {
            Entry::Occupied(occupied) => *occupied.get(),
            Entry::Vacant(_) => 0,
        };
        let next = current
            .checked_add(amount)
            .ok_or_else(|| TransferError::new("recipient balance overflow"))?;
        match entry {
            Entry::Occupied(mut occupied) => {
                occupied.insert(next);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(next);
            }
        }

        self.transfers.fetch_add(1, Ordering::SeqCst);
        info!(%recipient, amount, "In-memory sink: transfer delivered");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_credits_recipient() {
        let sink = InMemorySink::new();
        let alice = AccountId::new("alice");

        sink.send(&alice, 5).await.unwrap();
        sink.send(&alice, 2).await.unwrap();

        assert_eq!(sink.credited(&alice), 7);
        assert_eq!(sink.transfer_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failure_is_consumed_once() {
        let sink = InMemorySink::new();
        let bob = AccountId::new("bob");
        sink.fail_next(TransferError::new("rail down").with_data(vec![0xde, 0xad]));

        let err = sink.send(&bob, 3).await.unwrap_err();
        assert_eq!(err.message, "rail down");
        assert_eq!(err.data.as_ref(), &[0xde, 0xad]);
        assert_eq!(sink.credited(&bob), 0);

        sink.send(&bob, 3).await.unwrap();
        assert_eq!(sink.credited(&bob), 3);
        assert_eq!(sink.total_sent(), 3);
    }

    #[tokio::test]
    async fn test_overflowing_send_records_nothing() {
        let sink = InMemorySink::new();
        let carol = AccountId::new("carol");
        let dave = AccountId::new("dave");
        sink.send(&carol, Amount::MAX).await.unwrap();

        let err = sink.send(&carol, 1).await.unwrap_err();
        assert_eq!(err.message, "recipient balance overflow");
        assert_eq!(sink.credited(&carol), Amount::MAX);
        assert_eq!(sink.transfer_count(), 1);

        sink.fail_next(TransferError::new("rail down"));
        sink.send(&dave, 1).await.unwrap_err();
        assert!(!sink.credited.contains_key(&dave));
        assert_eq!(sink.credited.len(), 1);
    }
}
