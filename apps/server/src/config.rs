use std::{net::SocketAddr, str::FromStr, time::Duration};

use ratekeeper_core::errors::{Error, Result};

pub const DEFAULT_EXCHANGE_API_URL: &str = "https://api.binance.com/api/v3/ticker/price";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub db_path: String,
    pub currency_pair_ttl: Duration,
    pub exchange_api_url: String,
    pub exchange_fetch_interval: Duration,
    pub exchange_timeout: Duration,
    pub max_quote_age: Duration,
    pub expiry_sweep_interval: Duration,
    pub request_timeout: Duration,
    pub cors_allow: Vec<String>,
}

impl Config {
    /// Reads `RK_*` variables, loading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cors_allow = env_or("RK_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            listen_addr: parse_env("RK_LISTEN_ADDR", "0.0.0.0:8080")?,
            store_backend: parse_env("RK_STORE_BACKEND", "sqlite")?,
            db_path: env_or("RK_DB_PATH", "./db/quotes.db"),
            currency_pair_ttl: Duration::from_secs(parse_env("RK_CURRENCY_PAIR_TTL_SECS", "86400")?),
            exchange_api_url: env_or("RK_EXCHANGE_API_URL", DEFAULT_EXCHANGE_API_URL),
            exchange_fetch_interval: Duration::from_secs(parse_env(
                "RK_EXCHANGE_FETCH_INTERVAL_SECS",
                "10",
            )?),
            exchange_timeout: Duration::from_millis(parse_env("RK_EXCHANGE_TIMEOUT_MS", "30000")?),
            max_quote_age: Duration::from_secs(parse_env("RK_MAX_QUOTE_AGE_SECS", "60")?),
            expiry_sweep_interval: Duration::from_secs(parse_env(
                "RK_EXPIRY_SWEEP_INTERVAL_SECS",
                "300",
            )?),
            request_timeout: Duration::from_millis(parse_env("RK_REQUEST_TIMEOUT_MS", "30000")?),
            cors_allow,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_or(name, default);
    raw.trim()
        .parse()
        .map_err(|e| Error::InvalidConfigValue(format!("{}={:?}: {}", name, raw, e)))
}
