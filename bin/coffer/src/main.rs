//! Coffer - wallet ledger service.
//!
//! # Usage
//!
//! ```bash
//! # Start against PostgreSQL
//! DATABASE_URL=postgres://localhost/coffer coffer
//!
//! # Throwaway in-memory ledger
//! coffer --memory --port 3000
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use coffer_api::{ServerConfig, serve_with_shutdown};
use coffer_core::metrics::init_metrics;
use coffer_core::ports::LedgerStore;
use coffer_core::services::{AccountService, SeedConfig, seed_wallets};
use coffer_storage::{Database, DatabaseConfig, MemoryLedgerStore, PgLedgerStore};

/// Coffer CLI - wallet transfer ledger.
#[derive(Parser, Debug)]
#[command(name = "coffer")]
#[command(about = "Coffer - atomic wallet transfer ledger")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL. Falls back to DB_HOST, DB_PORT, DB_USER,
    /// DB_PASSWORD and DB_NAME when unset.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Number of wallets created on an empty ledger.
    #[arg(long, env = "SEED_COUNT", default_value_t = coffer_core::services::bootstrap::DEFAULT_SEED_COUNT)]
    seed_count: usize,

    /// Starting balance of each seeded wallet.
    #[arg(long, env = "SEED_BALANCE", default_value_t = coffer_core::services::bootstrap::DEFAULT_SEED_BALANCE)]
    seed_balance: f64,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Keep the ledger in memory instead of PostgreSQL.
    #[arg(long, conflicts_with = "migrate_only")]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional, failures don't stop the service)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<SocketAddr>() {
        Ok(metrics_addr) => match PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            Ok(()) => {
                init_metrics();
                true
            }
            Err(e) => {
                warn!("⚠️  Failed to start metrics exporter: {}. Continuing without metrics.", e);
                false
            }
        },
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Coffer");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ STORAGE
    // ─────────────────────────────────────────────────────────────────────────
    let (store, db): (Arc<dyn LedgerStore>, Option<Database>) = if cli.memory {
        warn!("⚠️  In-memory ledger: all data is lost on exit");
        (Arc::new(MemoryLedgerStore::new()), None)
    } else {
        let db_config = match &cli.database_url {
            Some(url) => DatabaseConfig::new(url),
            None => DatabaseConfig::from_env(),
        };
        debug!(database_url = %mask_password(&db_config.url), "Database endpoint");

        info!("🗄️  Connecting to database...");
        let db = Database::connect(&db_config)
            .await
            .context("Failed to connect to database")?;

        db.migrate().await.context("Failed to run migrations")?;
        info!("🗄️  Database ready (migrations applied)");

        if cli.migrate_only {
            info!("🛑 --migrate-only flag set, exiting");
            db.close().await;
            return Ok(());
        }

        (Arc::new(PgLedgerStore::new(&db)), Some(db))
    };

    store.ping().await.context("Ledger store is unreachable")?;

    // ─────────────────────────────────────────────────────────────────────────
    // 🌱 SEED
    // ─────────────────────────────────────────────────────────────────────────
    let seed_config = SeedConfig {
        count: cli.seed_count,
        balance: cli.seed_balance,
    };
    let seeded = seed_wallets(store.as_ref(), &seed_config)
        .await
        .context("Failed to seed wallets")?;
    if seeded == 0 {
        debug!("Ledger already populated, seeding skipped");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVE
    // ─────────────────────────────────────────────────────────────────────────
    let service = AccountService::new(store);
    let server_config = ServerConfig {
        port: cli.port,
        ..Default::default()
    };

    info!("✅ Coffer ready");
    info!("   ⚡ API:      http://localhost:{}/api", cli.port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    let served = serve_with_shutdown(service, server_config, shutdown_signal()).await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    if let Some(db) = db {
        db.close().await;
    }

    served.context("HTTP server error")?;

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "❌ Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "❌ Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
