//! Process configuration, read once at startup from the environment.

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://taskpond.sqlite?mode=rwc";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set and non-empty")]
    MissingJwtSecret,
    #[error("Invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", DEFAULT_HOST);
        let port = parse_port(std::env::var("PORT").ok())?;
        let database_url = env_or("DATABASE_URL", DEFAULT_DATABASE_URL);
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingJwtSecret)?;
        let token_ttl_days = parse_token_ttl_days(std::env::var("TOKEN_TTL_DAYS").ok())?;
        debug!(%host, port, %database_url, token_ttl_days, "Loaded configuration");

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            token_ttl_days,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_port(raw: Option<String>) -> Result<u16, ConfigError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_PORT),
        Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            name: "PORT",
            value: value.to_string(),
        }),
    }
}

fn parse_token_ttl_days(raw: Option<String>) -> Result<i64, ConfigError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_TOKEN_TTL_DAYS),
        Some(value) => match value.parse::<i64>() {
            Ok(days) if days > 0 => Ok(days),
            _ => Err(ConfigError::InvalidValue {
                name: "TOKEN_TTL_DAYS",
                value: value.to_string(),
            }),
        },
    }
}
