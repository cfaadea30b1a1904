//! Port trait for the ledger store.
//!
//! This trait defines the storage interface used by the domain layer.
//! Implementations live in the infrastructure layer (`coffer-storage`).

use async_trait::async_trait;

use crate::error::{LedgerResult, StorageResult};
use crate::models::{TransactionRecord, Wallet};

/// Durable wallet balances plus the append-only transaction history.
///
/// The store is the only writer of both tables. Every mutation runs inside
/// one unit of work: either all of its effects become visible at commit, or
/// none do.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Liveness probe.
    async fn ping(&self) -> StorageResult<()>;

    /// Committed balance of a wallet.
    ///
    /// Returns `NotFound` for unknown addresses.
    async fn get_balance(&self, address: &str) -> LedgerResult<f64>;

    /// Move `amount` from one wallet to another and record it.
    ///
    /// Fails with `InvalidAmount` when `amount` is not a positive finite
    /// number, `NotFound` when either wallet is missing and
    /// `InsufficientFunds` when the sender balance is below `amount`.
    /// Transfers sharing a wallet serialize on that wallet; the balance check
    /// always sees the result of every previously committed transfer.
    async fn transfer(&self, from: &str, to: &str, amount: f64) -> LedgerResult<TransactionRecord>;

    /// Most recent transactions first (timestamp, then id, descending).
    async fn recent_transactions(&self, limit: u32) -> LedgerResult<Vec<TransactionRecord>>;

    /// Insert a wallet unless the address already exists.
    ///
    /// Returns `true` when a row was created.
    async fn create_wallet(&self, address: &str, balance: f64) -> LedgerResult<bool>;

    /// Number of wallets in the ledger.
    async fn wallet_count(&self) -> LedgerResult<u64>;

    /// Insert `wallets` if, and only if, the ledger holds no wallets yet.
    ///
    /// The emptiness check and the inserts form one unit of work, so
    /// concurrent seeders cannot both populate the table. Returns the number
    /// of wallets inserted.
    async fn seed_wallets(&self, wallets: &[Wallet]) -> LedgerResult<u64>;
}

/// Validate a transfer amount.
///
/// Shared by every store implementation so that zero, negative, NaN and
/// infinite amounts are rejected before any unit of work starts.
pub fn ensure_positive_amount(amount: f64) -> LedgerResult<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(crate::error::LedgerError::InvalidAmount(amount))
    }
}

/// Validate a starting balance for a new wallet.
pub fn ensure_valid_balance(balance: f64) -> LedgerResult<()> {
    if balance.is_finite() && balance >= 0.0 {
        Ok(())
    } else {
        Err(crate::error::LedgerError::InvalidAmount(balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    #[test]
    fn test_amount_validation() {
        assert!(ensure_positive_amount(0.01).is_ok());

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                ensure_positive_amount(bad),
                Err(LedgerError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn test_balance_validation_allows_zero() {
        assert!(ensure_valid_balance(0.0).is_ok());
        assert!(ensure_valid_balance(100.0).is_ok());
        assert!(ensure_valid_balance(-0.5).is_err());
        assert!(ensure_valid_balance(f64::NAN).is_err());
    }
}
