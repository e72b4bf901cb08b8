//! Main ledger orchestration layer
//!
//! This module ties together state, actor, sink and notifications into the
//! public entry points of a vault ledger.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vault_ledger::{AccountId, InMemorySink, Ledger, Limits};
//!
//! #[tokio::main]
//! async fn main() -> vault_ledger::Result<()> {
//!     let sink = Arc::new(InMemorySink::new());
//!     let ledger = Ledger::initialize(Limits::new(10, 5), sink).await?;
//!
//!     let alice = AccountId::new("alice");
//!     ledger.deposit(&alice, 8).await?;
//!     ledger.withdraw(&alice, 5).await?;
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    dispatch::{self, Call, CallOutcome, Route},
    metrics::Metrics,
    sink::ValueTransferSink,
    state::LedgerState,
    types::{AccountId, Amount, LedgerEvent, Limits, Totals, Vault},
    Config, Error, Result,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for all reads and writes
    handle: LedgerHandle,

    /// Notification channel
    events: broadcast::Sender<LedgerEvent>,

    /// Metrics collector
    metrics: Metrics,

    /// Actor task
    worker: JoinHandle<()>,

    /// Configuration
    config: Config,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("limits", &self.handle.limits())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Create a ledger with fixed limits and default settings elsewhere
    pub async fn initialize(limits: Limits, sink: Arc<dyn ValueTransferSink>) -> Result<Self> {
        Self::open(Config::with_limits(limits), sink).await
    }

    /// Open ledger with configuration
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn open(config: Config, sink: Arc<dyn ValueTransferSink>) -> Result<Self> {
        config.validate()?;

        let limits: Limits = config.limits.into();
        if limits.withdraw_cap > limits.bank_cap {
            tracing::warn!(
                withdraw_cap = limits.withdraw_cap,
                bank_cap = limits.bank_cap,
                "Withdraw cap exceeds bank cap; it can never be reached"
            );
        }

        let metrics = Metrics::new()?;
        let (events, _) = broadcast::channel(config.events.channel_capacity);

        let (handle, worker) = spawn_ledger_actor(
            LedgerState::new(limits),
            sink,
            events.clone(),
            metrics.clone(),
            config.actor.mailbox_capacity,
        );

        tracing::info!(
            service = %config.service_name,
            bank_cap = limits.bank_cap,
            withdraw_cap = limits.withdraw_cap,
            "Ledger initialized"
        );

        Ok(Self {
            handle,
            events,
            metrics,
            worker,
            config,
        })
    }

    /// Cloneable handle to the ledger actor
    pub fn handle(&self) -> LedgerHandle {
        self.handle.clone()
    }

    /// Deposit `amount` into the caller's vault
    pub async fn deposit(&self, caller: &AccountId, amount: Amount) -> Result<LedgerEvent> {
        self.handle.deposit(caller.clone(), amount).await
    }

    /// Bare value received with no instruction
    ///
    /// Behaves exactly like [`deposit`](Self::deposit) of `value`.
    pub async fn receive(&self, caller: &AccountId, value: Amount) -> Result<LedgerEvent> {
        self.handle.deposit(caller.clone(), value).await
    }

    /// Withdraw `amount` from the caller's vault to the caller
    pub async fn withdraw(&self, caller: &AccountId, amount: Amount) -> Result<LedgerEvent> {
        self.handle.withdraw(caller.clone(), amount).await
    }

    /// Route and execute an inbound call
    pub async fn dispatch(&self, call: Call) -> Result<CallOutcome> {
        let route = match dispatch::route(&call) {
            Ok(route) => route,
            Err(e) => {
                self.metrics.record_rejection(e.reason());
                tracing::warn!(caller = %call.caller, value = call.value, "Rejected call: {}", e);
                return Err(e);
            }
        };

        let event = match route {
            Route::Receive(value) => self.receive(&call.caller, value).await?,
            Route::Deposit(value) => self.deposit(&call.caller, value).await?,
            Route::Withdraw(amount) => self.withdraw(&call.caller, amount).await?,
            Route::Ignore => {
                tracing::debug!(
                    caller = %call.caller,
                    payload_len = call.payload.len(),
                    "Ignored call with unrecognized payload and no value"
                );
                return Ok(CallOutcome::Ignored);
            }
        };

        Ok(CallOutcome::Completed(event))
    }

    /// Get account record; zeroed for unknown accounts
    pub async fn get_vault(&self, account: &AccountId) -> Result<Vault> {
        self.handle.get_vault(account.clone()).await
    }

    /// Get policy limits
    pub fn get_limits(&self) -> Limits {
        self.handle.limits()
    }

    /// Get running totals
    pub async fn get_totals(&self) -> Result<Totals> {
        self.handle.get_totals().await
    }

    /// Check that total funds equal the sum of balances and respect the cap
    pub async fn verify_invariants(&self) -> Result<()> {
        self.handle.verify_invariants().await
    }

    /// Subscribe to completed operation notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger
    ///
    /// Operations already queued complete before the actor stops.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.worker
            .await
            .map_err(|e| Error::Concurrency(format!("Ledger actor failed: {}", e)))?;
        tracing::info!("Ledger shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Instruction;
    use crate::sink::{InMemorySink, TransferError};
    use crate::types::EventKind;

    async fn create_test_ledger(bank_cap: Amount, withdraw_cap: Amount) -> (Ledger, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        let ledger = Ledger::initialize(Limits::new(bank_cap, withdraw_cap), sink.clone())
            .await
            .unwrap();
        (ledger, sink)
    }

    #[tokio::test]
    async fn test_ledger_open() {
        let (ledger, _) = create_test_ledger(10, 5).await;
        assert_eq!(ledger.get_limits(), Limits::new(10, 5));
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let mut config = Config::default();
        config.events.channel_capacity = 0;

        let result = Ledger::open(config, Arc::new(InMemorySink::new())).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unknown_vault_is_zeroed() {
        let (ledger, _) = create_test_ledger(10, 5).await;
        let vault = ledger.get_vault(&AccountId::new("nobody")).await.unwrap();
        assert_eq!(vault, Vault::default());
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_receive_matches_deposit() {
        let (ledger, _) = create_test_ledger(100, 5).await;
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");

        ledger.deposit(&alice, 7).await.unwrap();
        ledger.receive(&bob, 7).await.unwrap();

        assert_eq!(
            ledger.get_vault(&alice).await.unwrap(),
            ledger.get_vault(&bob).await.unwrap()
        );
        assert!(matches!(ledger.receive(&bob, 0).await, Err(Error::ZeroAmount)));

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_notifications_only_on_success() {
        let (ledger, sink) = create_test_ledger(10, 5).await;
        let mut events = ledger.subscribe();
        let alice = AccountId::new("alice");

        ledger.deposit(&alice, 8).await.unwrap();
        assert!(ledger.withdraw(&alice, 6).await.is_err());
        sink.fail_next(TransferError::new("offline"));
        assert!(ledger.withdraw(&alice, 5).await.is_err());
        ledger.withdraw(&alice, 5).await.unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::Deposited);
        assert_eq!((first.amount, first.new_balance), (8, 8));

        let second = events.recv().await.unwrap();
        assert_eq!(second.kind, EventKind::Withdrawn);
        assert_eq!((second.amount, second.new_balance), (5, 3));

        assert!(events.try_recv().is_err());
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_routes() {
        let (ledger, sink) = create_test_ledger(10, 5).await;
        let alice = AccountId::new("alice");

        let outcome = ledger.dispatch(Call::transfer(alice.clone(), 4)).await.unwrap();
        assert_eq!(outcome.event().map(|e| e.new_balance), Some(4));

        let call = Call::instruction(alice.clone(), 2, &Instruction::Deposit).unwrap();
        ledger.dispatch(call).await.unwrap();

        let call = Call::instruction(alice.clone(), 0, &Instruction::Withdraw { amount: 5 }).unwrap();
        let outcome = ledger.dispatch(call).await.unwrap();
        assert_eq!(outcome.event().map(|e| e.new_balance), Some(1));
        assert_eq!(sink.credited(&alice), 5);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_dispatch_fallback_is_noop() {
        // Compatibility choice: unknown zero-value calls are accepted and ignored
        let (ledger, _) = create_test_ledger(10, 5).await;
        let alice = AccountId::new("alice");
        let totals_before = ledger.get_totals().await.unwrap();

        let outcome = ledger
            .dispatch(Call::raw(alice.clone(), 0, &b"\xde\xad\xbe\xef"[..]))
            .await
            .unwrap();
        assert_eq!(outcome, CallOutcome::Ignored);

        let err = ledger
            .dispatch(Call::raw(alice.clone(), 3, &b"\xde\xad\xbe\xef"[..]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedPayload { .. }));

        assert_eq!(ledger.get_totals().await.unwrap(), totals_before);
        assert_eq!(ledger.get_vault(&alice).await.unwrap(), Vault::default());
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_track_operations() {
        let (ledger, _) = create_test_ledger(10, 5).await;
        let alice = AccountId::new("alice");

        ledger.deposit(&alice, 8).await.unwrap();
        let _ = ledger.deposit(&alice, 0).await;
        ledger.withdraw(&alice, 2).await.unwrap();

        let metrics = ledger.metrics();
        assert_eq!(metrics.deposits_total.get(), 1);
        assert_eq!(metrics.withdrawals_total.get(), 1);
        assert_eq!(metrics.total_funds.get(), 6);
        assert_eq!(
            metrics
                .rejections_total
                .with_label_values(&["zero_amount"])
                .get(),
            1
        );

        ledger.shutdown().await.unwrap();
    }
}
