//! Core domain layer for the Coffer wallet ledger.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! services for moving value between wallets. It follows hexagonal
//! architecture principles - this is the innermost layer with no
//! dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      coffer (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │        coffer-api (HTTP)       │   coffer-storage (Pg/mem)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     coffer-core  ← YOU ARE HERE             │
//! │            (models, ports, services, addresses)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Address, Wallet, TransactionRecord)
//! - [`ports`] - The [`ports::LedgerStore`] trait adapters implement
//! - [`services`] - [`services::AccountService`] and startup seeding
//! - [`address`] - Secure wallet address generation
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Transfer Lifecycle
//!
//! 1. The adapter calls [`services::AccountService::send`]
//! 2. The service forwards to [`ports::LedgerStore::transfer`]
//! 3. The store validates the amount, locks both wallets, checks funds
//! 4. Balances are updated and a transaction record is appended
//! 5. The unit of work commits, or is discarded on any failure

pub mod address;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
