//! Configuration management for the Apollo enrichment service.
//!
//! This module handles loading and validating configuration from environment variables.
//! The API key is a secret and is merged into request payloads by the client; it is
//! never sent as a header.

use crate::error::{ConfigError, ConfigResult};
use std::env;

/// Default Apollo API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.apollo.io/v1";

/// Configuration for the Apollo enrichment client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Apollo API base URL
    pub api_base_url: String,

    /// Apollo API key (required secret)
    pub api_key: String,

    /// Maximum concurrent requests AND maximum requests per window (default: 10)
    pub rate_limit_max: usize,

    /// Sliding rate-limit window in milliseconds (default: 1000)
    pub rate_limit_window_ms: u64,

    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,

    /// Retry budget for 429 responses (default: 3)
    pub max_retries: u32,

    /// Base delay for exponential retry backoff in milliseconds (default: 2000)
    pub retry_base_delay_ms: u64,

    /// Log level (default: "info")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `APOLLO_API_KEY`: API key for authentication
    ///
    /// Optional environment variables:
    /// - `APOLLO_API_BASE_URL`: Base URL for the Apollo API (default: https://api.apollo.io/v1)
    /// - `APOLLO_RATE_LIMIT_MAX`: Concurrency and per-window request cap (default: 10)
    /// - `APOLLO_RATE_LIMIT_WINDOW_MS`: Sliding window length in ms (default: 1000)
    /// - `APOLLO_REQUEST_TIMEOUT_SECS`: HTTP timeout in seconds (default: 30)
    /// - `APOLLO_MAX_RETRIES`: Retry budget for 429 responses (default: 3)
    /// - `APOLLO_RETRY_BASE_DELAY_MS`: Backoff base delay in ms (default: 2000)
    /// - `LOG_LEVEL`: Logging level (default: "info")
    pub fn from_env() -> ConfigResult<Self> {
        // Try to load .env file if it exists (but don't fail if it doesn't)
        let _ = dotenvy::dotenv();

        let api_key = env::var("APOLLO_API_KEY")
            .map_err(|_| ConfigError::MissingVar("APOLLO_API_KEY".to_string()))?;

        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                var: "APOLLO_API_KEY".to_string(),
                reason: "Cannot be empty".to_string(),
            });
        }

        let api_base_url =
            env::var("APOLLO_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                var: "APOLLO_API_BASE_URL".to_string(),
                reason: "Must start with http:// or https://".to_string(),
            });
        }

        let rate_limit_max = Self::parse_env_usize("APOLLO_RATE_LIMIT_MAX", 10)?;
        if rate_limit_max == 0 {
            return Err(ConfigError::InvalidValue {
                var: "APOLLO_RATE_LIMIT_MAX".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        let rate_limit_window_ms = Self::parse_env_u64("APOLLO_RATE_LIMIT_WINDOW_MS", 1000)?;
        if rate_limit_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                var: "APOLLO_RATE_LIMIT_WINDOW_MS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        let request_timeout_secs = Self::parse_env_u64("APOLLO_REQUEST_TIMEOUT_SECS", 30)?;
        let max_retries = Self::parse_env_u32("APOLLO_MAX_RETRIES", 3)?;
        let retry_base_delay_ms = Self::parse_env_u64("APOLLO_RETRY_BASE_DELAY_MS", 2000)?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            api_base_url,
            api_key,
            rate_limit_max,
            rate_limit_window_ms,
            request_timeout_secs,
            max_retries,
            retry_base_delay_ms,
            log_level,
        })
    }

    /// Parse an environment variable as u64 with a default value.
    fn parse_env_u64(var_name: &str, default: u64) -> ConfigResult<u64> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as u32 with a default value.
    fn parse_env_u32(var_name: &str, default: u32) -> ConfigResult<u32> {
        match env::var(var_name) {
            Ok(val) => val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }

    /// Parse an environment variable as usize with a default value.
    fn parse_env_usize(var_name: &str, default: usize) -> ConfigResult<usize> {
        match env::var(var_name) {
            Ok(val) => val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                var: var_name.to_string(),
                reason: format!("Must be a positive number, got: {}", val),
            }),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            rate_limit_max: 10,
            rate_limit_window_ms: 1000,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 2000,
            log_level: "info".to_string(),
        }
    }
}
