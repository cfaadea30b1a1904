//! Storage layer for the Coffer ledger.
//!
//! This crate provides the implementations of the `LedgerStore` port
//! defined in `coffer-core`:
//!
//! - [`postgres::PgLedgerStore`] - PostgreSQL, the production backend
//! - [`memory::MemoryLedgerStore`] - in-process backend with the same
//!   transfer semantics, used by tests and `--memory` runs
//!
//! # Usage
//!
//! ```ignore
//! use coffer_storage::{Database, DatabaseConfig, PgLedgerStore};
//!
//! // Connect to the database
//! let db = Database::connect(&DatabaseConfig::from_env()).await?;
//!
//! // Create tables
//! db.migrate().await?;
//!
//! // Share one store handle with the service
//! let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(&db));
//! ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::{Database, DatabaseConfig, PgLedgerStore};
