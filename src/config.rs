use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::db::RetryPolicy;

/// PostgreSQL connection parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 5432,
            name: "devops_db".to_string(),
            user: "devops_user".to_string(),
            password: "devops_pass".to_string(),
        }
    }
}

/// Which engine backs the visit store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    Postgres(DbConfig),
    /// Path or URL accepted by `SqliteConnectOptions`, e.g. `sqlite:data/visits.db`.
    Sqlite(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub container_name: String,
    pub backend: Backend,
    pub retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DbConfig::default();
        let or_default = |key: &str, default: String| lookup(key).unwrap_or(default);

        let backend = match lookup("DATABASE_URL") {
            Some(url) if url.starts_with("sqlite:") => Backend::Sqlite(url),
            _ => Backend::Postgres(DbConfig {
                host: or_default("DB_HOST", defaults.host),
                port: parse_or(&lookup, "DB_PORT", defaults.port)?,
                name: or_default("DB_NAME", defaults.name),
                user: or_default("DB_USER", defaults.user),
                password: or_default("DB_PASSWORD", defaults.password),
            }),
        };

        let fallback = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "DB_CONNECT_ATTEMPTS", fallback.max_attempts)?,
            delay: Duration::from_secs(parse_or(
                &lookup,
                "DB_CONNECT_DELAY_SECS",
                fallback.delay.as_secs(),
            )?),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 5000)?,
            container_name: or_default("CONTAINER_NAME", "api-service".to_string()),
            backend,
            retry,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}
