//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `vault_deposits_total` - Successful deposits
//! - `vault_withdrawals_total` - Successful withdrawals
//! - `vault_rejections_total{reason}` - Rejected operations by error reason
//! - `vault_transfer_rollbacks_total` - Withdrawals reverted after a sink failure
//! - `vault_total_funds` - Aggregate funds held (saturates at i64::MAX)
//! - `vault_operation_duration_seconds` - Latency of state-changing operations

use crate::types::Amount;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Metrics collector
///
/// Each collector owns its own registry so several ledgers can live in one
/// process.
#[derive(Clone)]
pub struct Metrics {
    /// Successful deposits
    pub deposits_total: IntCounter,

    /// Successful withdrawals
    pub withdrawals_total: IntCounter,

    /// Rejected operations, labelled by reason
    pub rejections_total: IntCounterVec,

    /// Withdrawals rolled back after the transfer failed
    pub transfer_rollbacks_total: IntCounter,

    /// Aggregate funds
    pub total_funds: IntGauge,

    /// Operation latency histogram
    pub operation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("deposits_total", &self.deposits_total.get())
            .field("withdrawals_total", &self.withdrawals_total.get())
            .field("total_funds", &self.total_funds.get())
            .finish()
    }
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total = IntCounter::new("vault_deposits_total", "Successful deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("vault_withdrawals_total", "Successful withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("vault_rejections_total", "Rejected operations by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let transfer_rollbacks_total = IntCounter::new(
            "vault_transfer_rollbacks_total",
            "Withdrawals reverted after a failed transfer",
        )?;
        registry.register(Box::new(transfer_rollbacks_total.clone()))?;

        let total_funds = IntGauge::new("vault_total_funds", "Aggregate funds held")?;
        registry.register(Box::new(total_funds.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "vault_operation_duration_seconds",
                "Latency of deposits and withdrawals",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.0]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            deposits_total,
            withdrawals_total,
            rejections_total,
            transfer_rollbacks_total,
            total_funds,
            operation_duration,
            registry,
        })
    }

    /// Record a successful deposit
    pub fn record_deposit(&self, total_funds: Amount) {
        self.deposits_total.inc();
        self.set_total_funds(total_funds);
    }

    /// Record a successful withdrawal
    pub fn record_withdrawal(&self, total_funds: Amount) {
        self.withdrawals_total.inc();
        self.set_total_funds(total_funds);
    }

    /// Record a rejected operation
    pub fn record_rejection(&self, reason: &str) {
        self.rejections_total.with_label_values(&[reason]).inc();
    }

    /// Record a rolled back withdrawal
    pub fn record_rollback(&self) {
        self.transfer_rollbacks_total.inc();
    }

    /// Record operation duration
    pub fn record_duration(&self, duration_seconds: f64) {
        self.operation_duration.observe(duration_seconds);
    }

    fn set_total_funds(&self, total_funds: Amount) {
        self.total_funds
            .set(i64::try_from(total_funds).unwrap_or(i64::MAX));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
