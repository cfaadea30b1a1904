//! HTTP server.

use std::future::Future;

use axum::Router;
use axum::routing::{get, post};
use tracing::{debug, info};

use coffer_core::services::AccountService;

use crate::handlers::{balance, health_check, last_transactions, send};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Routes of the ledger API, bound to `service`.
pub fn router(service: AccountService) -> Router {
    Router::new()
        .route("/api/send", post(send))
        .route("/api/transactions", get(last_transactions))
        .route("/api/wallet/{address}/balance", get(balance))
        .route("/health", get(health_check))
        .with_state(service)
}

/// Start the HTTP server.
pub async fn serve(service: AccountService, config: ServerConfig) -> Result<(), std::io::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("⚡ HTTP server listening on http://{}", addr);

    axum::serve(listener, router(service)).await
}

/// Start the HTTP server with graceful shutdown support.
pub async fn serve_with_shutdown<F>(
    service: AccountService,
    config: ServerConfig,
    shutdown_signal: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    debug!(addr = %addr, "Server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use coffer_core::address::generate_address;
    use coffer_core::ports::LedgerStore;
    use coffer_storage::MemoryLedgerStore;

    use super::*;

    struct Fixture {
        app: Router,
        w1: String,
        w2: String,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryLedgerStore::new());
        let w1 = generate_address().unwrap().to_hex();
        let w2 = generate_address().unwrap().to_hex();
        store.create_wallet(&w1, 100.0).await.unwrap();
        store.create_wallet(&w2, 0.0).await.unwrap();

        Fixture {
            app: router(AccountService::new(store)),
            w1,
            w2,
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_send(body: Value) -> Request<Body> {
        Request::post("/api/send")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_send_returns_record_and_updates_balances() {
        let f = fixture().await;

        let (status, body) = call(
            &f.app,
            post_send(json!({ "from": f.w1, "to": f.w2, "amount": 30.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["from"], json!(f.w1));
        assert_eq!(body["to"], json!(f.w2));
        assert_eq!(body["amount"], json!(30.0));
        assert!(body["id"].is_i64());
        assert!(body["timestamp"].is_string());

        let (status, body) = call(&f.app, get(&format!("/api/wallet/{}/balance", f.w1))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "balance": 70.0 }));

        let (_, body) = call(&f.app, get("/api/transactions?count=5")).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_send_error_statuses() {
        let f = fixture().await;
        let missing = generate_address().unwrap().to_hex();

        let cases = [
            (json!({ "from": f.w1, "to": f.w2, "amount": 0.0 }), StatusCode::BAD_REQUEST),
            (json!({ "from": f.w1, "to": f.w2, "amount": -1.0 }), StatusCode::BAD_REQUEST),
            (json!({ "from": f.w1, "to": "not-hex", "amount": 1.0 }), StatusCode::BAD_REQUEST),
            (json!({ "from": f.w1, "to": f.w2 }), StatusCode::BAD_REQUEST),
            (json!({ "from": f.w1, "to": missing, "amount": 1.0 }), StatusCode::NOT_FOUND),
            (
                json!({ "from": f.w1, "to": f.w2, "amount": 100.5 }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (request, expected) in cases {
            let (status, body) = call(&f.app, post_send(request.clone())).await;
            assert_eq!(status, expected, "request {request}");
            assert!(body["error"].is_string(), "request {request}");
        }

        let (_, body) = call(&f.app, get(&format!("/api/wallet/{}/balance", f.w1))).await;
        assert_eq!(body, json!({ "balance": 100.0 }));
    }

    #[tokio::test]
    async fn test_transactions_count_validation() {
        let f = fixture().await;

        for uri in [
            "/api/transactions",
            "/api/transactions?count=0",
            "/api/transactions?count=-3",
            "/api/transactions?count=abc",
        ] {
            let (status, _) = call(&f.app, get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }

        let (status, body) = call(&f.app, get("/api/transactions?count=5000")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_balance_of_unknown_or_malformed_wallet() {
        let f = fixture().await;
        let missing = generate_address().unwrap().to_hex();

        let (status, _) = call(&f.app, get(&format!("/api/wallet/{missing}/balance"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&f.app, get("/api/wallet/XYZ/balance")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_check() {
        let f = fixture().await;
        let response = f.app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
