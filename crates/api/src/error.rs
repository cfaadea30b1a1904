//! Mapping of ledger errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use coffer_core::error::{LedgerError, StorageError};

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be parsed or failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// The ledger rejected or failed the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(err) => ledger_status(err),
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAmount(_) | LedgerError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Storage(StorageError::ConnectionError(_)) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage details stay in the logs.
        let message = if status.is_server_error() {
            error!(error = %self, "❌ Request failed");
            "Internal storage error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: chaque catégorie d'erreur a son code HTTP
    #[test]
    fn test_status_mapping() {
        let cases = [
            (LedgerError::InvalidAmount(0.0), StatusCode::BAD_REQUEST),
            (
                LedgerError::InvalidAddress("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (LedgerError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                LedgerError::InsufficientFunds {
                    address: "x".into(),
                    balance: 1.0,
                    requested: 2.0,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                StorageError::ConnectionError("down".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                StorageError::TransactionError("commit".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_bad_request_keeps_message() {
        let err = ApiError::BadRequest("Invalid count parameter".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid count parameter");
    }
}
