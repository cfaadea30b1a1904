//! Account service - orchestrates ledger operations for callers.
//!
//! The service holds no state besides the store handle. Every call
//! round-trips to the store.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::{LedgerError, LedgerResult, StorageResult};
use crate::metrics::{TransferTimer, record_transfer, transfer_outcome};
use crate::models::TransactionRecord;
use crate::ports::LedgerStore;

/// Domain entry point used by the HTTP adapter.
///
/// Errors from the store are returned unchanged.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Move `amount` from `from` to `to`.
    #[instrument(skip(self, from, to), fields(from = %short(from), to = %short(to)))]
    pub async fn send(&self, from: &str, to: &str, amount: f64) -> LedgerResult<TransactionRecord> {
        let result = {
            let _timer = TransferTimer::new();
            self.store.transfer(from, to, amount).await
        };

        record_transfer(transfer_outcome(&result));

        match &result {
            Ok(record) => debug!(id = record.id, "Transfer committed"),
            Err(LedgerError::Storage(e)) => warn!(error = %e, "Transfer aborted by store fault"),
            Err(e) => debug!(error = %e, "Transfer rejected"),
        }

        result
    }

    /// Committed balance of `address`.
    #[instrument(skip(self, address), fields(address = %short(address)))]
    pub async fn get_balance(&self, address: &str) -> LedgerResult<f64> {
        self.store.get_balance(address).await
    }

    /// The `count` most recent transactions, newest first.
    #[instrument(skip(self))]
    pub async fn get_last_transactions(&self, count: u32) -> LedgerResult<Vec<TransactionRecord>> {
        self.store.recent_transactions(count).await
    }

    /// Check that the store is reachable.
    pub async fn ping(&self) -> StorageResult<()> {
        self.store.ping().await
    }
}

/// First 8 characters of an address for log fields.
fn short(address: &str) -> &str {
    address.get(..8).unwrap_or(address)
}
