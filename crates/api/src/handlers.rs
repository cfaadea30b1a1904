//! REST handlers for transfers, balances and history.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use coffer_core::error::LedgerError;
use coffer_core::models::{Address, TransactionRecord};
use coffer_core::ports::ensure_positive_amount;
use coffer_core::services::AccountService;

use crate::error::ApiError;

/// Upper bound on `count` for `/api/transactions`.
pub const MAX_TRANSACTIONS_PAGE: u32 = 1000;

/// Body of `POST /api/send`.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

/// Query string of `GET /api/transactions`.
#[derive(Debug, Deserialize)]
pub struct TransactionsParams {
    pub count: Option<String>,
}

/// Body of `GET /api/wallet/{address}/balance`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

/// Move funds between two wallets.
pub async fn send(
    State(service): State<AccountService>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    ensure_positive_amount(request.amount)?;

    validate_address(&request.from)?;
    validate_address(&request.to)?;

    let record = service
        .send(&request.from, &request.to, request.amount)
        .await?;

    Ok(Json(record))
}

/// The `count` most recent transactions.
pub async fn last_transactions(
    State(service): State<AccountService>,
    params: Result<Query<TransactionsParams>, QueryRejection>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    let count = params
        .ok()
        .and_then(|Query(p)| p.count)
        .and_then(|c| c.trim().parse::<u32>().ok())
        .filter(|c| *c > 0)
        .ok_or_else(|| ApiError::BadRequest("Invalid count parameter".to_string()))?;

    let transactions = service
        .get_last_transactions(count.min(MAX_TRANSACTIONS_PAGE))
        .await?;

    Ok(Json(transactions))
}

/// Balance of one wallet.
pub async fn balance(
    State(service): State<AccountService>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    validate_address(&address)?;

    let balance = service.get_balance(&address).await?;

    Ok(Json(BalanceResponse { balance }))
}

/// Health check endpoint.
pub async fn health_check(State(service): State<AccountService>) -> (StatusCode, &'static str) {
    match service.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
    }
}

fn validate_address(address: &str) -> Result<(), ApiError> {
    if Address::is_valid(address) {
        Ok(())
    } else {
        Err(LedgerError::InvalidAddress(address.to_string()).into())
    }
}
