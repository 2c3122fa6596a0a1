//! Application configuration.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Missing exchange-rate settings are not a start-up failure: the
//! currency gateway reports them as configuration errors when it is used.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::currency::{CurrencySet, DEFAULT_TIMEOUT, GatewayConfig};

pub const DEFAULT_DATABASE_PATH: &str = "bankdata.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: String,
    pub app_host: String,
    pub app_port: u16,
    pub gateway: GatewayConfig,
    pub currencies: CurrencySet,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            app_host: DEFAULT_HOST.to_string(),
            app_port: DEFAULT_PORT,
            gateway: GatewayConfig::default(),
            currencies: CurrencySet::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Recognised variables: `DATABASE_PATH`, `APP_HOST`, `APP_PORT`,
    /// `EXCHANGE_RATE_API_KEY`, `EXCHANGE_RATE_API_URL`,
    /// `EXCHANGE_RATE_TIMEOUT_SECS`, `SUPPORTED_CURRENCIES`, `LOG_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let app_port = match get("APP_PORT") {
            Some(value) => value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "APP_PORT".to_string(),
                    message: e.to_string(),
                }
            })?,
            None => defaults.app_port,
        };

        let timeout = match get("EXCHANGE_RATE_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidValue {
                        key: "EXCHANGE_RATE_TIMEOUT_SECS".to_string(),
                        message: e.to_string(),
                    }
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "EXCHANGE_RATE_TIMEOUT_SECS".to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let currencies = match get("SUPPORTED_CURRENCIES") {
            Some(value) => {
                let set = CurrencySet::parse_list(&value).map_err(|e| {
                    ConfigError::InvalidValue {
                        key: "SUPPORTED_CURRENCIES".to_string(),
                        message: e.to_string(),
                    }
                })?;
                if set.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "SUPPORTED_CURRENCIES".to_string(),
                        message: "at least one currency is required".to_string(),
                    });
                }
                set
            }
            None => defaults.currencies,
        };

        let log_format = match get("LOG_FORMAT").map(|v| v.trim().to_lowercase()) {
            None => LogFormat::Pretty,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(v) if v == "json" => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "LOG_FORMAT".to_string(),
                    message: format!("expected 'pretty' or 'json', got '{}'", other),
                });
            }
        };

        Ok(Self {
            database_path: get("DATABASE_PATH").unwrap_or(defaults.database_path),
            app_host: get("APP_HOST").unwrap_or(defaults.app_host),
            app_port,
            gateway: GatewayConfig {
                api_key: get("EXCHANGE_RATE_API_KEY"),
                base_url: get("EXCHANGE_RATE_API_URL"),
                timeout,
            },
            currencies,
            log_format,
        })
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    /// Fail unless the exchange-rate credential and URL are both present.
    pub fn require_gateway(&self) -> Result<(), ConfigError> {
        if self.gateway.api_key.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "EXCHANGE_RATE_API_KEY".to_string(),
            ));
        }
        if self.gateway.base_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "EXCHANGE_RATE_API_URL".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.gateway.timeout, DEFAULT_TIMEOUT);
        assert!(config.gateway.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_PATH", "/tmp/ledger.db"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "3000"),
            ("EXCHANGE_RATE_API_KEY", "key"),
            ("EXCHANGE_RATE_API_URL", "https://rates.example/v6/"),
            ("EXCHANGE_RATE_TIMEOUT_SECS", "3"),
            ("SUPPORTED_CURRENCIES", "EUR,GBP,USD"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.database_path, "/tmp/ledger.db");
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.gateway.api_key.as_deref(), Some("key"));
        assert_eq!(
            config.gateway.base_url.as_deref(),
            Some("https://rates.example/v6/")
        );
        assert_eq!(config.gateway.timeout, Duration::from_secs(3));
        assert_eq!(config.currencies.codes().len(), 3);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.require_gateway().is_ok());
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = load(&[("EXCHANGE_RATE_API_KEY", "  ")]).unwrap();
        assert!(config.gateway.api_key.is_none());
        assert_eq!(
            config.require_gateway(),
            Err(ConfigError::MissingEnvVar("EXCHANGE_RATE_API_KEY".to_string()))
        );
    }

    #[rstest]
    #[case::port("APP_PORT", "eighty")]
    #[case::port_range("APP_PORT", "70000")]
    #[case::timeout("EXCHANGE_RATE_TIMEOUT_SECS", "soon")]
    #[case::zero_timeout("EXCHANGE_RATE_TIMEOUT_SECS", "0")]
    #[case::currency("SUPPORTED_CURRENCIES", "DKK,dollars")]
    #[case::log_format("LOG_FORMAT", "xml")]
    fn test_invalid_values(#[case] key: &str, #[case] value: &str) {
        let err = load(&[(key, value)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: k, .. } if k == key));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::MissingEnvVar("TEST_VAR".to_string()).to_string(),
            "Missing environment variable: TEST_VAR"
        );
        assert_eq!(
            ConfigError::InvalidValue {
                key: "APP_PORT".to_string(),
                message: "must be a number".to_string(),
            }
            .to_string(),
            "Invalid value for APP_PORT: must be a number"
        );
    }
}
