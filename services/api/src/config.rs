//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use lingo_core::streak::MAX_WINDOW_DAYS;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub chat_model: String,
    pub quiz_model: String,
    pub store_timeout: Duration,
    pub streak_window_days: u32,
    pub session_ttl_days: i64,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            chat_model: "gemini-1.5-pro-latest".to_string(),
            quiz_model: "gemini-1.5-flash".to_string(),
            store_timeout: Duration::from_secs(10),
            streak_window_days: 21,
            session_ttl_days: 30,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source, applying defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => parse_var("BIND_ADDRESS", &raw)?,
            None => defaults.bind_address,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generative API (optional) ---
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let gemini_base_url = lookup("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url);
        let chat_model = lookup("CHAT_MODEL").unwrap_or(defaults.chat_model);
        let quiz_model = lookup("QUIZ_MODEL").unwrap_or(defaults.quiz_model);

        // --- Behaviour ---
        let store_timeout = match lookup("STORE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var::<u64>("STORE_TIMEOUT_SECS", &raw)?),
            None => defaults.store_timeout,
        };
        let streak_window_days = match lookup("STREAK_WINDOW_DAYS") {
            Some(raw) => parse_var("STREAK_WINDOW_DAYS", &raw)?,
            None => defaults.streak_window_days,
        };
        if streak_window_days == 0 || streak_window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::InvalidValue(
                "STREAK_WINDOW_DAYS".to_string(),
                format!("must be between 1 and {}", MAX_WINDOW_DAYS),
            ));
        }
        let session_ttl_days = match lookup("SESSION_TTL_DAYS") {
            Some(raw) => parse_var("SESSION_TTL_DAYS", &raw)?,
            None => defaults.session_ttl_days,
        };
        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            gemini_api_key,
            gemini_base_url,
            chat_model,
            quiz_model,
            store_timeout,
            streak_window_days,
            session_ttl_days,
            cors_origin,
        })
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.database_url.is_none());
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.streak_window_days, 21);
        assert_eq!(config.store_timeout, Duration::from_secs(10));
        assert_eq!(config.bind_address.port(), 3000);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/lingo"),
            ("STORE_TIMEOUT_SECS", "3"),
            ("STREAK_WINDOW_DAYS", "7"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/lingo"));
        assert_eq!(config.store_timeout, Duration::from_secs(3));
        assert_eq!(config.streak_window_days, 7);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_addr = Config::from_lookup(lookup_from(&[("BIND_ADDRESS", "nowhere")]));
        assert!(matches!(bad_addr, Err(ConfigError::InvalidValue(name, _)) if name == "BIND_ADDRESS"));

        let zero_window = Config::from_lookup(lookup_from(&[("STREAK_WINDOW_DAYS", "0")]));
        assert!(zero_window.is_err());

        let long_window = Config::from_lookup(lookup_from(&[("STREAK_WINDOW_DAYS", "367")]));
        assert!(matches!(long_window, Err(ConfigError::InvalidValue(name, _)) if name == "STREAK_WINDOW_DAYS"));
        let year = Config::from_lookup(lookup_from(&[("STREAK_WINDOW_DAYS", "366")])).unwrap();
        assert_eq!(year.streak_window_days, 366);
    }
}
