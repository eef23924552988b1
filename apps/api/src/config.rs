use std::str::FromStr;

use anyhow::{Context, Result};

use crate::matching::persister::DEFAULT_PERSIST_CONCURRENCY;
use crate::matching::triggers::DEFAULT_MAX_CONCURRENT_BATCHES;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// When unset, notifications are only logged.
    pub notification_webhook_url: Option<String>,
    pub max_concurrent_batches: usize,
    pub persist_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            notification_webhook_url: optional_env("NOTIFICATION_WEBHOOK_URL"),
            max_concurrent_batches: parse_env(
                "MATCH_MAX_CONCURRENT_BATCHES",
                DEFAULT_MAX_CONCURRENT_BATCHES,
            )?,
            persist_concurrency: parse_env(
                "MATCH_PERSIST_CONCURRENCY",
                DEFAULT_PERSIST_CONCURRENCY,
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value(key, std::env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        _ => Ok(default),
    }
}
