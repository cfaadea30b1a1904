//! Metrics definitions for the ledger.
//!
//! This module defines all metrics used throughout the service.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

use crate::error::LedgerError;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "transfers_total",
        "Total number of transfer attempts, labelled by outcome"
    );
    describe_histogram!(
        "transfer_duration_seconds",
        "Time taken to run a transfer unit of work in seconds"
    );
    describe_counter!(
        "wallets_seeded_total",
        "Total number of wallets created by startup seeding"
    );
}

/// Label value for a transfer result.
pub fn transfer_outcome<T>(result: &Result<T, LedgerError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(LedgerError::InvalidAmount(_)) => "invalid_amount",
        Err(LedgerError::InvalidAddress(_)) => "invalid_address",
        Err(LedgerError::NotFound(_)) => "not_found",
        Err(LedgerError::InsufficientFunds { .. }) => "insufficient_funds",
        Err(LedgerError::Storage(_)) => "storage_error",
    }
}

/// Record a transfer attempt.
///
/// # Arguments
/// * `outcome` - Label from [`transfer_outcome`]
pub fn record_transfer(outcome: &'static str) {
    counter!("transfers_total", "outcome" => outcome).increment(1);
}

/// Record transfer duration.
pub fn record_transfer_duration(duration_secs: f64) {
    histogram!("transfer_duration_seconds").record(duration_secs);
}

/// Record the number of wallets created by seeding.
pub fn record_wallets_seeded(count: u64) {
    counter!("wallets_seeded_total").increment(count);
}

/// A timer that automatically records transfer duration when dropped.
pub struct TransferTimer {
    start: Instant,
}

impl TransferTimer {
    /// Start a new transfer timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for TransferTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransferTimer {
    fn drop(&mut self) {
        record_transfer_duration(self.start.elapsed().as_secs_f64());
    }
}
