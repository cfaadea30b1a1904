//! Ledger store implementation for PostgreSQL.
//!
//! Transfers use pessimistic row locks: both wallet rows are taken with
//! `SELECT ... FOR UPDATE` in ascending address order inside one database
//! transaction. Transfers touching a common wallet therefore serialize on
//! that row, while transfers on disjoint pairs never wait on each other.
//! The `sqlx::Transaction` rolls back when dropped, so every early return
//! below discards the unit of work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use coffer_core::error::{LedgerError, LedgerResult, StorageResult};
use coffer_core::models::{TransactionRecord, Wallet};
use coffer_core::ports::{LedgerStore, ensure_positive_amount, ensure_valid_balance};

use super::database::Database;
use super::helpers::{connection_error, query_error, transaction_error};

/// PostgreSQL implementation of LedgerStore.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(connection_error)?;
        Ok(())
    }

    async fn get_balance(&self, address: &str) -> LedgerResult<f64> {
        let row: Option<(f64,)> = sqlx::query_as("SELECT balance FROM wallets WHERE address = $1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.map(|(balance,)| balance)
            .ok_or_else(|| LedgerError::NotFound(address.to_string()))
    }

    #[instrument(skip(self))]
    async fn transfer(&self, from: &str, to: &str, amount: f64) -> LedgerResult<TransactionRecord> {
        ensure_positive_amount(amount)?;

        let mut tx = self.pool.begin().await.map_err(transaction_error)?;

        // Lock order is the address order, whichever side sends.
        let locked = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT address, balance
            FROM wallets
            WHERE address = ANY($1)
            ORDER BY address
            FOR UPDATE
            "#,
        )
        .bind(vec![from.to_string(), to.to_string()])
        .fetch_all(&mut *tx)
        .await
        .map_err(query_error)?;

        let sender = locked
            .iter()
            .find(|row| row.address == from)
            .ok_or_else(|| LedgerError::NotFound(from.to_string()))?;

        if sender.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                address: from.to_string(),
                balance: sender.balance,
                requested: amount,
            });
        }

        if !locked.iter().any(|row| row.address == to) {
            return Err(LedgerError::NotFound(to.to_string()));
        }

        // A self-transfer is recorded but leaves the balance untouched.
        if from != to {
            sqlx::query("UPDATE wallets SET balance = balance - $1 WHERE address = $2")
                .bind(amount)
                .bind(from)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;

            sqlx::query("UPDATE wallets SET balance = balance + $1 WHERE address = $2")
                .bind(amount)
                .bind(to)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (from_address, to_address, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_address, to_address, amount, timestamp
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(transaction_error)?;

        debug!(id = row.id, "Transfer committed");

        Ok(row.into_record())
    }

    async fn recent_transactions(&self, limit: u32) -> LedgerResult<Vec<TransactionRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, from_address, to_address, amount, timestamp
            FROM transactions
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.into_iter().map(TransactionRow::into_record).collect())
    }

    async fn create_wallet(&self, address: &str, balance: f64) -> LedgerResult<bool> {
        ensure_valid_balance(balance)?;

        let result = sqlx::query(
            r#"
            INSERT INTO wallets (address, balance)
            VALUES ($1, $2)
            ON CONFLICT (address) DO NOTHING
            "#,
        )
        .bind(address)
        .bind(balance)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn wallet_count(&self) -> LedgerResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets")
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(count as u64)
    }

    #[instrument(skip_all, fields(wallets = wallets.len()))]
    async fn seed_wallets(&self, wallets: &[Wallet]) -> LedgerResult<u64> {
        for wallet in wallets {
            ensure_valid_balance(wallet.balance)?;
        }

        let mut tx = self.pool.begin().await.map_err(transaction_error)?;

        // Self-conflicting lock: a second seeder waits here until the first
        // commits, then sees a non-empty table.
        sqlx::query("LOCK TABLE wallets IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets")
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;

        if existing > 0 {
            debug!(existing, "Wallet table not empty, skipping seed");
            return Ok(0);
        }

        let mut inserted = 0;
        for wallet in wallets {
            let result = sqlx::query(
                r#"
                INSERT INTO wallets (address, balance)
                VALUES ($1, $2)
                ON CONFLICT (address) DO NOTHING
                "#,
            )
            .bind(wallet.address.to_hex())
            .bind(wallet.balance)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(transaction_error)?;

        Ok(inserted)
    }
}

// =============================================================================
// Row mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct WalletRow {
    address: String,
    balance: f64,
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    from_address: String,
    to_address: String,
    amount: f64,
    timestamp: DateTime<Utc>,
}

impl TransactionRow {
    fn into_record(self) -> TransactionRecord {
        TransactionRecord {
            id: self.id,
            from_address: self.from_address,
            to_address: self.to_address,
            amount: self.amount,
            timestamp: self.timestamp,
        }
    }
}
