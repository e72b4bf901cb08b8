//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns `LedgerState`; nothing else can read or write it
//! - Each message runs to completion, including the outbound transfer,
//!   before the next one is taken from the mailbox
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Callers (RPC, wallet, dispatcher)           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │  check ─▶ effects ─▶ sink.send() ─▶ commit/rollback  │
//! │                       │                               │
//! │                       ▼                               │
//! │          broadcast::Sender<LedgerEvent>               │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    metrics::Metrics,
    sink::{TransferError, ValueTransferSink},
    state::LedgerState,
    types::{AccountId, Amount, EventKind, LedgerEvent, Limits, Totals, Vault},
    Error, Result,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Credit value to an account
    Deposit {
        /// Account to credit
        account: AccountId,
        /// Value to credit
        amount: Amount,
        /// Completed event or rejection
        response: oneshot::Sender<Result<LedgerEvent>>,
    },

    /// Debit an account and send the value out
    Withdraw {
        /// Account to debit and pay out to
        account: AccountId,
        /// Value to withdraw
        amount: Amount,
        /// Completed event or rejection
        response: oneshot::Sender<Result<LedgerEvent>>,
    },

    /// Get an account record
    GetVault {
        /// Account to look up
        account: AccountId,
        /// Vault record, zeroed if unknown
        response: oneshot::Sender<Vault>,
    },

    /// Get running totals
    GetTotals {
        /// Current totals
        response: oneshot::Sender<Totals>,
    },

    /// Recompute totals and check invariants
    VerifyInvariants {
        /// Audit outcome
        response: oneshot::Sender<Result<()>>,
    },

    /// Stop accepting messages and drain the mailbox
    Shutdown,
}

/// Actor that owns the ledger state
pub struct LedgerActor {
    /// Account state
    state: LedgerState,

    /// Outbound transfer capability
    sink: Arc<dyn ValueTransferSink>,

    /// Completed operation notifications
    events: broadcast::Sender<LedgerEvent>,

    /// Metrics collector
    metrics: Metrics,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl std::fmt::Debug for LedgerActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerActor")
            .field("limits", &self.state.limits())
            .field("totals", &self.state.totals())
            .finish_non_exhaustive()
    }
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        state: LedgerState,
        sink: Arc<dyn ValueTransferSink>,
        events: broadcast::Sender<LedgerEvent>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<LedgerMessage>,
    ) -> Self {
        Self {
            state,
            sink,
            events,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                // Operations already accepted still complete
                self.mailbox.close();
                while let Some(pending) = self.mailbox.recv().await {
                    self.handle_message(pending).await;
                }
                break;
            }
            self.handle_message(msg).await;
        }

        tracing::debug!(totals = ?self.state.totals(), "Ledger actor stopped");
    }

    /// Handle a single message
    async fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Deposit {
                account,
                amount,
                response,
            } => {
                let result = self.deposit(account, amount);
                let _ = response.send(result);
            }

            LedgerMessage::Withdraw {
                account,
                amount,
                response,
            } => {
                let result = self.withdraw(account, amount).await;
                let _ = response.send(result);
            }

            LedgerMessage::GetVault { account, response } => {
                let _ = response.send(self.state.vault(&account));
            }

            LedgerMessage::GetTotals { response } => {
                let _ = response.send(self.state.totals());
            }

            LedgerMessage::VerifyInvariants { response } => {
                let _ = response.send(self.state.audit());
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn deposit(&mut self, account: AccountId, amount: Amount) -> Result<LedgerEvent> {
        let started = Instant::now();

        let new_balance = match self.state.credit(&account, amount) {
            Ok(balance) => balance,
            Err(e) => return Err(self.reject("deposit", &account, amount, e)),
        };

        let total_funds = self.state.totals().total_funds;
        self.metrics.record_deposit(total_funds);
        self.metrics.record_duration(started.elapsed().as_secs_f64());
        tracing::info!(%account, amount, new_balance, total_funds, "Deposited");

        Ok(self.publish(EventKind::Deposited, account, amount, new_balance))
    }

    async fn withdraw(&mut self, account: AccountId, amount: Amount) -> Result<LedgerEvent> {
        let started = Instant::now();

        // Checks, then effects
        let staged = match self.state.debit(&account, amount) {
            Ok(staged) => staged,
            Err(e) => return Err(self.reject("withdraw", &account, amount, e)),
        };

        // Interaction runs in its own task; a sink panic is a failed transfer
        let sink = Arc::clone(&self.sink);
        let recipient = staged.account().clone();
        let value = staged.amount();
        let sent = match tokio::spawn(async move { sink.send(&recipient, value).await }).await {
            Ok(sent) => sent,
            Err(join_err) => {
                tracing::error!(%account, amount, error = %join_err, "Transfer sink panicked");
                Err(TransferError::new("sink panicked"))
            }
        };
        if let Err(details) = sent {
            self.state.rollback(staged);
            self.metrics.record_rollback();
            let err = Error::TransferFailed { details };
            return Err(self.reject("withdraw", &account, amount, err));
        }

        let new_balance = self.state.commit(staged);
        let total_funds = self.state.totals().total_funds;
        self.metrics.record_withdrawal(total_funds);
        self.metrics.record_duration(started.elapsed().as_secs_f64());
        tracing::info!(%account, amount, new_balance, total_funds, "Withdrawn");

        Ok(self.publish(EventKind::Withdrawn, account, amount, new_balance))
    }

    fn reject(&self, operation: &str, account: &AccountId, amount: Amount, err: Error) -> Error {
        self.metrics.record_rejection(err.reason());
        tracing::warn!(%account, amount, reason = err.reason(), "Rejected {}: {}", operation, err);
        err
    }

    fn publish(
        &self,
        kind: EventKind,
        account: AccountId,
        amount: Amount,
        new_balance: Amount,
    ) -> LedgerEvent {
        let event = LedgerEvent::new(kind, account, amount, new_balance);
        // No subscribers is fine
        let _ = self.events.send(event.clone());
        event
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
    limits: Limits,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>, limits: Limits) -> Self {
        Self { sender, limits }
    }

    /// Policy limits (immutable, no round trip)
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Deposit `amount` into `account`
    pub async fn deposit(&self, account: AccountId, amount: Amount) -> Result<LedgerEvent> {
        self.request(|response| LedgerMessage::Deposit {
            account,
            amount,
            response,
        })
        .await?
    }

    /// Withdraw `amount` from `account` to its owner
    pub async fn withdraw(&self, account: AccountId, amount: Amount) -> Result<LedgerEvent> {
        self.request(|response| LedgerMessage::Withdraw {
            account,
            amount,
            response,
        })
        .await?
    }

    /// Get account record
    pub async fn get_vault(&self, account: AccountId) -> Result<Vault> {
        self.request(|response| LedgerMessage::GetVault { account, response })
            .await
    }

    /// Get running totals
    pub async fn get_totals(&self) -> Result<Totals> {
        self.request(|response| LedgerMessage::GetTotals { response })
            .await
    }

    /// Check funds accounting invariants
    pub async fn verify_invariants(&self) -> Result<()> {
        self.request(|response| LedgerMessage::VerifyInvariants { response })
            .await?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    state: LedgerState,
    sink: Arc<dyn ValueTransferSink>,
    events: broadcast::Sender<LedgerEvent>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> (LedgerHandle, JoinHandle<()>) {
    let limits = state.limits();
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = LedgerActor::new(state, sink, events, metrics, rx);

    let worker = tokio::spawn(async move {
        actor.run().await;
    });

    (LedgerHandle::new(tx, limits), worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{InMemorySink, TransferError};

    fn spawn(limits: Limits) -> (LedgerHandle, Arc<InMemorySink>, JoinHandle<()>) {
        let sink = Arc::new(InMemorySink::new());
        let (events, _) = broadcast::channel(16);
        let (handle, worker) = spawn_ledger_actor(
            LedgerState::new(limits),
            sink.clone(),
            events,
            Metrics::new().unwrap(),
            16,
        );
        (handle, sink, worker)
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (handle, _sink, worker) = spawn(Limits::new(10, 5));

        handle.shutdown().await.unwrap();
        worker.await.unwrap();

        // Mailbox is closed after shutdown
        let err = handle.get_totals().await.unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_actor_deposit_and_withdraw() {
        let (handle, sink, _worker) = spawn(Limits::new(10, 5));
        let alice = AccountId::new("alice");

        let event = handle.deposit(alice.clone(), 8).await.unwrap();
        assert_eq!(event.kind, EventKind::Deposited);
        assert_eq!(event.new_balance, 8);

        let event = handle.withdraw(alice.clone(), 5).await.unwrap();
        assert_eq!(event.kind, EventKind::Withdrawn);
        assert_eq!(event.new_balance, 3);
        assert_eq!(sink.credited(&alice), 5);

        handle.verify_invariants().await.unwrap();
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_rolls_back_failed_transfer() {
        let (handle, sink, _worker) = spawn(Limits::new(10, 5));
        let alice = AccountId::new("alice");
        handle.deposit(alice.clone(), 8).await.unwrap();
        let vault_before = handle.get_vault(alice.clone()).await.unwrap();
        let totals_before = handle.get_totals().await.unwrap();

        sink.fail_next(TransferError::new("recipient reverted"));
        let err = handle.withdraw(alice.clone(), 5).await.unwrap_err();
        assert!(matches!(err, Error::TransferFailed { .. }));

        assert_eq!(handle.get_vault(alice.clone()).await.unwrap(), vault_before);
        assert_eq!(handle.get_totals().await.unwrap(), totals_before);
        assert_eq!(sink.credited(&alice), 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_accepted_operations() {
        let (handle, _sink, worker) = spawn(Limits::new(10, 5));
        let alice = AccountId::new("alice");

        // Both messages are queued before the actor runs: the deposit sits
        // behind the shutdown request and must still be applied.
        handle.shutdown().await.unwrap();
        let event = handle.deposit(alice, 4).await.unwrap();
        assert_eq!(event.new_balance, 4);

        worker.await.unwrap();
    }
}
