//! Shared helpers for mapping `sqlx` failures into storage errors.

use coffer_core::error::StorageError;

/// Map a failure that happened while reaching the database.
///
/// Pool exhaustion and I/O failures are reported as connection errors so
/// callers can tell an unreachable store from a failing statement.
pub fn connection_error(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StorageError::ConnectionError(e.to_string()),
        other => StorageError::QueryError(other.to_string()),
    }
}

/// Map a statement failure.
pub fn query_error(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StorageError::SerializationError(e.to_string())
        }
        other => connection_error(other),
    }
}

/// Map a begin/commit/rollback failure.
pub fn transaction_error(e: sqlx::Error) -> StorageError {
    match connection_error(e) {
        StorageError::QueryError(msg) => StorageError::TransactionError(msg),
        other => other,
    }
}
