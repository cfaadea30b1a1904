//! Startup seeding of the wallet table.
//!
//! Seeding runs on every start. It only writes when the ledger holds no
//! wallets at all, so repeated runs never add rows.

use tracing::{debug, info, instrument};

use crate::address::generate_addresses;
use crate::error::BootstrapResult;
use crate::metrics::record_wallets_seeded;
use crate::models::Wallet;
use crate::ports::{LedgerStore, ensure_valid_balance};

/// Number of wallets created on a cold start.
pub const DEFAULT_SEED_COUNT: usize = 10;

/// Starting balance of each seeded wallet.
pub const DEFAULT_SEED_BALANCE: f64 = 100.0;

/// Seeding parameters.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Wallets to create when the ledger is empty.
    pub count: usize,
    /// Balance given to each new wallet.
    pub balance: f64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_SEED_COUNT,
            balance: DEFAULT_SEED_BALANCE,
        }
    }
}

/// Seed the ledger with `config.count` fresh wallets if it is empty.
///
/// Returns the number of wallets created (zero when the ledger was already
/// populated).
#[instrument(skip(store))]
pub async fn seed_wallets(store: &dyn LedgerStore, config: &SeedConfig) -> BootstrapResult<u64> {
    if config.count == 0 {
        return Ok(0);
    }

    ensure_valid_balance(config.balance)?;

    // Skip address generation entirely on warm starts.
    let existing = store.wallet_count().await?;
    if existing > 0 {
        debug!(existing, "Ledger already seeded");
        return Ok(0);
    }

    let wallets: Vec<Wallet> = generate_addresses(config.count)?
        .into_iter()
        .map(|address| Wallet::new(address, config.balance))
        .collect();

    let created = store.seed_wallets(&wallets).await?;
    record_wallets_seeded(created);

    if created > 0 {
        info!(created, balance = config.balance, "🌱 Seeded wallets");
        for wallet in wallets.iter().take(created as usize) {
            debug!(address = %wallet.address, "Seed wallet");
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{BootstrapError, LedgerError, LedgerResult, StorageResult};
    use crate::models::TransactionRecord;

    /// Counts wallets only; enough to exercise the seeding decision.
    #[derive(Default)]
    struct CountingStore {
        wallets: Mutex<Vec<Wallet>>,
    }

    #[async_trait]
    impl LedgerStore for CountingStore {
        async fn ping(&self) -> StorageResult<()> {
            Ok(())
        }

        async fn get_balance(&self, address: &str) -> LedgerResult<f64> {
            Err(LedgerError::NotFound(address.to_string()))
        }

        async fn transfer(
            &self,
            from: &str,
            _to: &str,
            _amount: f64,
        ) -> LedgerResult<TransactionRecord> {
            Err(LedgerError::NotFound(from.to_string()))
        }

        async fn recent_transactions(&self, _limit: u32) -> LedgerResult<Vec<TransactionRecord>> {
            Ok(Vec::new())
        }

        async fn create_wallet(&self, _address: &str, _balance: f64) -> LedgerResult<bool> {
            Ok(false)
        }

        async fn wallet_count(&self) -> LedgerResult<u64> {
            Ok(self.wallets.lock().unwrap().len() as u64)
        }

        async fn seed_wallets(&self, wallets: &[Wallet]) -> LedgerResult<u64> {
            let mut stored = self.wallets.lock().unwrap();
            if !stored.is_empty() {
                return Ok(0);
            }
            stored.extend_from_slice(wallets);
            Ok(wallets.len() as u64)
        }
    }

    #[tokio::test]
    async fn test_seeding_twice_keeps_original_count() {
        let store = CountingStore::default();
        let config = SeedConfig::default();

        assert_eq!(seed_wallets(&store, &config).await.unwrap(), 10);
        assert_eq!(seed_wallets(&store, &config).await.unwrap(), 0);
        assert_eq!(store.wallet_count().await.unwrap(), 10);

        let wallets = store.wallets.lock().unwrap();
        assert!(wallets.iter().all(|w| w.balance == DEFAULT_SEED_BALANCE));
    }

    #[tokio::test]
    async fn test_negative_seed_balance_is_rejected() {
        let store = CountingStore::default();
        let config = SeedConfig {
            count: 2,
            balance: -1.0,
        };

        let err = seed_wallets(&store, &config).await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Ledger(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(store.wallet_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_count_is_noop() {
        let store = CountingStore::default();
        let config = SeedConfig {
            count: 0,
            balance: 100.0,
        };
        assert_eq!(seed_wallets(&store, &config).await.unwrap(), 0);
    }
}
