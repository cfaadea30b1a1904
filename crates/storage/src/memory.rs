//! In-process ledger store.
//!
//! Each wallet balance lives in its own mutex. A transfer locks the cells
//! of both wallets in ascending address order, so transfers that share a
//! wallet serialize on it and transfers on disjoint pairs run in parallel.
//! The transaction history sits behind a separate mutex that is always
//! taken after wallet cells, never before.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use coffer_core::error::{LedgerError, LedgerResult, StorageError, StorageResult};
use coffer_core::models::{TransactionRecord, Wallet};
use coffer_core::ports::{LedgerStore, ensure_positive_amount, ensure_valid_balance};

type BalanceCell = Arc<Mutex<f64>>;

/// In-memory implementation of LedgerStore.
#[derive(Default)]
pub struct MemoryLedgerStore {
    wallets: RwLock<HashMap<String, BalanceCell>>,
    history: Mutex<History>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed balance of every wallet.
    ///
    /// All cells are held at once, in ascending address order, so the
    /// snapshot never shows half of a transfer.
    pub fn balances(&self) -> StorageResult<HashMap<String, f64>> {
        let mut cells: Vec<(String, BalanceCell)> = {
            let wallets = self.wallets.read().map_err(poisoned)?;
            wallets
                .iter()
                .map(|(address, cell)| (address.clone(), Arc::clone(cell)))
                .collect()
        };
        cells.sort_by(|a, b| a.0.cmp(&b.0));

        let guards = cells
            .iter()
            .map(|(address, cell)| cell.lock().map(|guard| (address, guard)).map_err(poisoned))
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(guards
            .iter()
            .map(|(address, guard)| ((*address).clone(), **guard))
            .collect())
    }

    fn cell(&self, address: &str) -> StorageResult<Option<BalanceCell>> {
        let wallets = self.wallets.read().map_err(poisoned)?;
        Ok(wallets.get(address).cloned())
    }

    fn read_balance(&self, address: &str) -> LedgerResult<f64> {
        let cell = self
            .cell(address)?
            .ok_or_else(|| LedgerError::NotFound(address.to_string()))?;
        let balance = *cell.lock().map_err(poisoned)?;
        Ok(balance)
    }

    fn run_transfer(&self, from: &str, to: &str, amount: f64) -> LedgerResult<TransactionRecord> {
        ensure_positive_amount(amount)?;

        let mut cells: Vec<(&str, BalanceCell)> = Vec::with_capacity(2);
        for address in [from, to] {
            if cells.iter().any(|(a, _)| *a == address) {
                continue;
            }
            if let Some(cell) = self.cell(address)? {
                cells.push((address, cell));
            }
        }

        let mut unit = TransferUnit::lock(&mut cells)?;

        let balance = unit
            .balance(from)
            .ok_or_else(|| LedgerError::NotFound(from.to_string()))?;

        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                address: from.to_string(),
                balance,
                requested: amount,
            });
        }

        if unit.balance(to).is_none() {
            return Err(LedgerError::NotFound(to.to_string()));
        }

        // Last fallible step; nothing has been written yet.
        let mut history = self.history.lock().map_err(poisoned)?;

        unit.commit(from, to, amount);
        let record = history.append(from, to, amount);

        debug!(id = record.id, "Transfer committed");

        Ok(record)
    }

    fn insert_wallet(&self, address: &str, balance: f64) -> LedgerResult<bool> {
        ensure_valid_balance(balance)?;

        let mut wallets = self.wallets.write().map_err(poisoned)?;
        if wallets.contains_key(address) {
            return Ok(false);
        }
        wallets.insert(address.to_string(), Arc::new(Mutex::new(balance)));
        Ok(true)
    }

    fn seed(&self, seed: &[Wallet]) -> LedgerResult<u64> {
        for wallet in seed {
            ensure_valid_balance(wallet.balance)?;
        }

        let mut wallets = self.wallets.write().map_err(poisoned)?;
        if !wallets.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;
        for wallet in seed {
            let address = wallet.address.to_hex();
            if !wallets.contains_key(&address) {
                wallets.insert(address, Arc::new(Mutex::new(wallet.balance)));
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn get_balance(&self, address: &str) -> LedgerResult<f64> {
        self.read_balance(address)
    }

    #[instrument(skip(self))]
    async fn transfer(&self, from: &str, to: &str, amount: f64) -> LedgerResult<TransactionRecord> {
        self.run_transfer(from, to, amount)
    }

    async fn recent_transactions(&self, limit: u32) -> LedgerResult<Vec<TransactionRecord>> {
        let history = self.history.lock().map_err(poisoned)?;
        Ok(history.recent(limit as usize))
    }

    async fn create_wallet(&self, address: &str, balance: f64) -> LedgerResult<bool> {
        self.insert_wallet(address, balance)
    }

    async fn wallet_count(&self) -> LedgerResult<u64> {
        let wallets = self.wallets.read().map_err(poisoned)?;
        Ok(wallets.len() as u64)
    }

    async fn seed_wallets(&self, wallets: &[Wallet]) -> LedgerResult<u64> {
        self.seed(wallets)
    }
}

// =============================================================================
// Unit of work
// =============================================================================

/// Locked wallet cells for one transfer.
///
/// Balances are only written by [`TransferUnit::commit`]. Any other exit
/// drops the guards and leaves every cell as it was.
struct TransferUnit<'a> {
    guards: Vec<(&'a str, MutexGuard<'a, f64>)>,
}

impl<'a> TransferUnit<'a> {
    /// Lock `cells` in ascending address order.
    fn lock<'c: 'a>(cells: &'a mut [(&'c str, BalanceCell)]) -> StorageResult<Self> {
        cells.sort_by(|a, b| a.0.cmp(b.0));
        let cells: &'a [(&'c str, BalanceCell)] = cells;

        let mut guards = Vec::with_capacity(cells.len());
        for (address, cell) in cells.iter() {
            guards.push((*address, cell.lock().map_err(poisoned)?));
        }
        Ok(Self { guards })
    }

    fn balance(&self, address: &str) -> Option<f64> {
        self.guards
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, guard)| **guard)
    }

    fn commit(&mut self, from: &str, to: &str, amount: f64) {
        // A self-transfer is recorded but leaves the balance untouched.
        if from == to {
            return;
        }
        for (address, guard) in self.guards.iter_mut() {
            if *address == from {
                **guard -= amount;
            } else if *address == to {
                **guard += amount;
            }
        }
    }
}

// =============================================================================
// Transaction history
// =============================================================================

#[derive(Default)]
struct History {
    records: Vec<TransactionRecord>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl History {
    fn append(&mut self, from: &str, to: &str, amount: f64) -> TransactionRecord {
        // Keep timestamps non-decreasing even if the wall clock steps back.
        let now = Utc::now();
        let timestamp = self.last_timestamp.map_or(now, |last| last.max(now));
        self.last_timestamp = Some(timestamp);

        let record = TransactionRecord {
            id: self.records.len() as i64 + 1,
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount,
            timestamp,
        };
        self.records.push(record.clone());
        record
    }

    /// Records are stored in id order with non-decreasing timestamps, so
    /// newest-first is plain reverse order.
    fn recent(&self, limit: usize) -> Vec<TransactionRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::TransactionError("ledger lock poisoned by a panicked writer".to_string())
}
