//! Error types for the ledger domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`StorageError`] - Database/store faults
//! - [`LedgerError`] - Transfer and query failures surfaced to callers
//! - [`AddressError`] - Wallet address generation and parsing failures
//! - [`BootstrapError`] - Startup seeding failures
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and store errors.
///
/// These errors originate from store operations like queries,
/// transactions, and row decoding. A transfer that fails with one of
/// these leaves the ledger in its pre-transfer state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish or keep a database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Transaction begin/commit/rollback failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Row data could not be decoded into a domain value.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Ledger Errors
// =============================================================================

/// Failures of ledger operations.
///
/// The store produces these, the account service forwards them unchanged,
/// and the HTTP adapter maps them to status codes.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount was zero, negative, or not a finite number.
    #[error("Invalid amount: {0} (must be a positive finite number)")]
    InvalidAmount(f64),

    /// Address is not 64 lowercase hexadecimal characters.
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Sender or receiver wallet does not exist.
    #[error("Wallet not found: {0}")]
    NotFound(String),

    /// Sender balance is below the requested amount.
    #[error("Insufficient funds in {address}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Sender address.
        address: String,
        /// Balance observed inside the unit of work.
        balance: f64,
        /// Requested transfer amount.
        requested: f64,
    },

    /// Store fault.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Address Errors
// =============================================================================

/// Wallet address generation and parsing errors.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The secure random source failed.
    #[error("Failed to generate random bytes: {0}")]
    Generation(String),

    /// Address has the wrong length.
    #[error("Address must be 64 characters, got {0}")]
    InvalidLength(usize),

    /// Address contains a character outside `[0-9a-f]`.
    #[error("Address contains non lowercase-hex character {character:?} at position {position}")]
    InvalidCharacter {
        /// Offending character.
        character: char,
        /// Character index in the input.
        position: usize,
    },
}

impl From<AddressError> for LedgerError {
    fn from(err: AddressError) -> Self {
        LedgerError::InvalidAddress(err.to_string())
    }
}

// =============================================================================
// Bootstrap Errors
// =============================================================================

/// Errors raised while seeding the ledger at startup.
///
/// All of these are fatal: the process has no partial-availability mode.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Seed address generation failed.
    #[error("Address generation failed: {0}")]
    Address(#[from] AddressError),

    /// The store rejected the seed wallets.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Storage fault while seeding.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: la chaîne de conversion d'erreurs fonctionne
    // Permet d'utiliser ? à travers les couches
    #[test]
    fn test_error_conversion_chain() {
        // Storage -> Ledger -> Bootstrap
        let storage_err = StorageError::QueryError("db failed".into());
        let ledger_err: LedgerError = storage_err.into();
        assert!(matches!(ledger_err, LedgerError::Storage(_)));

        let bootstrap_err: BootstrapError = ledger_err.into();

        // Le message original est préservé
        assert!(bootstrap_err.to_string().contains("db failed"));
    }

    #[test]
    fn test_address_error_becomes_invalid_address() {
        let err: LedgerError = AddressError::InvalidLength(12).into();
        match err {
            LedgerError::InvalidAddress(msg) => assert!(msg.contains("got 12")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // Test critique: InsufficientFunds contient les infos de debug nécessaires
    #[test]
    fn test_insufficient_funds_includes_amounts() {
        let err = LedgerError::InsufficientFunds {
            address: "aa".repeat(32),
            balance: 40.0,
            requested: 60.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("40") && msg.contains("60"));
        assert!(msg.contains(&"aa".repeat(32)));
    }
}
