//! PostgreSQL database connection and configuration.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use coffer_core::error::{StorageError, StorageResult};

/// Default PostgreSQL port used when composing a URL from `DB_*` variables.
const DEFAULT_DB_PORT: u16 = 5432;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    ///
    /// This is the admission control for concurrent transfers.
    pub max_connections: u32,
    /// Minimum number of connections to maintain.
    pub min_connections: u32,
    /// Connection acquisition timeout.
    pub acquire_timeout: Duration,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
    /// Maximum connection lifetime.
    pub max_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/coffer".to_string(),
            max_connections: 20,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl DatabaseConfig {
    /// Create config for the given URL with default pool settings.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// `DATABASE_URL` wins when set. Otherwise the URL is composed from
    /// `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`.
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .or_else(|| url_from_parts(|key| std::env::var(key).ok()))
            .unwrap_or_else(|| Self::default().url);

        Self::new(&url)
    }
}

/// Build a connection URL from discrete `DB_*` settings.
///
/// Credentials and database name are percent-encoded. Returns `None` when
/// `DB_HOST` is missing or the parts do not form a valid URL.
fn url_from_parts(var: impl Fn(&str) -> Option<String>) -> Option<String> {
    let host = var("DB_HOST").filter(|h| !h.is_empty())?;
    let port = match var("DB_PORT").filter(|p| !p.is_empty()) {
        Some(port) => port.parse::<u16>().ok()?,
        None => DEFAULT_DB_PORT,
    };

    let mut url = Url::parse(&format!("postgres://{host}:{port}/")).ok()?;

    if let Some(user) = var("DB_USER").filter(|u| !u.is_empty()) {
        url.set_username(&user).ok()?;
        if let Some(password) = var("DB_PASSWORD").filter(|p| !p.is_empty()) {
            url.set_password(Some(&password)).ok()?;
        }
    }

    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push(&var("DB_NAME").unwrap_or_default());
    url.set_query(Some("sslmode=disable"));

    Some(url.into())
}

/// Database connection pool wrapper.
///
/// Constructed once at startup and shared by every request.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the database with the given configuration.
    #[instrument(skip_all)]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        debug!(
            max_conn = config.max_connections,
            min_conn = config.min_connections,
            "Creating connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(&config.url)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        debug!("Connection pool created");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `wallets` and `transactions` tables.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> StorageResult<()> {
        debug!("Running migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationError(e.to_string()))?;

        debug!("Migrations completed");

        Ok(())
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::str::FromStr;

    use sqlx::postgres::PgConnectOptions;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_url_from_parts_full() {
        let url = url_from_parts(vars(&[
            ("DB_HOST", "db"),
            ("DB_USER", "coffer"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "ledger"),
        ]))
        .unwrap();
        assert_eq!(url, "postgres://coffer:secret@db:5432/ledger?sslmode=disable");
    }

    #[test]
    fn test_url_from_parts_custom_port_no_password() {
        let url = url_from_parts(vars(&[
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("DB_USER", "coffer"),
            ("DB_NAME", "ledger"),
        ]))
        .unwrap();
        assert_eq!(url, "postgres://coffer@db:6543/ledger?sslmode=disable");
    }

    // Test critique: des identifiants avec caractères réservés ne doivent pas déplacer l'hôte
    #[test]
    fn test_url_from_parts_encodes_reserved_characters() {
        let url = url_from_parts(vars(&[
            ("DB_HOST", "db"),
            ("DB_USER", "cof@fer"),
            ("DB_PASSWORD", "se/cr#et:?"),
            ("DB_NAME", "ledger"),
        ]))
        .unwrap();

        let options = PgConnectOptions::from_str(&url).unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "cof@fer");
        assert_eq!(options.get_database(), Some("ledger"));

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("db"));
        assert_eq!(parsed.query(), Some("sslmode=disable"));
    }

    #[test]
    fn test_url_from_parts_rejects_bad_port() {
        assert!(url_from_parts(vars(&[("DB_HOST", "db"), ("DB_PORT", "x")])).is_none());
    }

    #[test]
    fn test_url_from_parts_requires_host() {
        assert!(url_from_parts(vars(&[("DB_USER", "coffer")])).is_none());
    }
}
