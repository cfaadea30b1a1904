//! PostgreSQL storage adapter.
//!
//! This module implements the ledger port defined in `coffer-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgLedgerStore`] - `LedgerStore` over the `wallets` and `transactions` tables
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::from_env();
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = PgLedgerStore::new(&db);
//! ```

mod database;
mod helpers;
mod ledger_repo;

pub use database::{Database, DatabaseConfig};
pub use ledger_repo::PgLedgerStore;
