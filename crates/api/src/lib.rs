//! REST API for the Coffer ledger.
//!
//! | Method | Path                              | Operation                  |
//! |--------|-----------------------------------|----------------------------|
//! | POST   | `/api/send`                       | transfer between wallets   |
//! | GET    | `/api/transactions?count=N`       | N most recent transactions |
//! | GET    | `/api/wallet/{address}/balance`   | balance of one wallet      |
//! | GET    | `/health`                         | store reachability         |
//!
//! Errors are returned as `{"error": "<message>"}`.

mod error;
mod handlers;
mod server;

pub use error::{ApiError, ErrorBody};
pub use handlers::{BalanceResponse, MAX_TRANSACTIONS_PAGE, SendRequest};
pub use server::{ServerConfig, router, serve, serve_with_shutdown};
