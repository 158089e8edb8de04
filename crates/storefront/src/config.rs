//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `QKART_API_ENDPOINT` - Backend API base URL (default: `http://localhost:8082/api/v1`)
//! - `QKART_SEARCH_DEBOUNCE_MS` - Quiet period before a search is issued (default: 500)
//! - `QKART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `QKART_TOKEN_FILE` - JSON key-value file holding the session token
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend endpoint (local development server).
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8082/api/v1";

/// Default search debounce delay in milliseconds.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API base URL, e.g. `http://localhost:8082/api/v1`
    pub api_endpoint: Url,
    /// Trailing-edge debounce delay for search queries
    pub search_debounce: Duration,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Location of the token store file, if any
    pub token_file: Option<PathBuf>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_endpoint: parse_endpoint(DEFAULT_API_ENDPOINT)
                .unwrap_or_else(|_| unreachable!("default endpoint is a valid URL")),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_file: None,
            sentry_dsn: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_endpoint = parse_endpoint(&get_env_or_default(
            "QKART_API_ENDPOINT",
            DEFAULT_API_ENDPOINT,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("QKART_API_ENDPOINT".to_string(), e))?;

        let search_debounce = Duration::from_millis(get_parsed_env(
            "QKART_SEARCH_DEBOUNCE_MS",
            DEFAULT_SEARCH_DEBOUNCE_MS,
        )?);

        let request_timeout_secs =
            get_parsed_env("QKART_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "QKART_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_endpoint,
            search_debounce,
            request_timeout: Duration::from_secs(request_timeout_secs),
            token_file: get_optional_env("QKART_TOKEN_FILE").map(PathBuf::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns a copy of this configuration pointing at another endpoint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `endpoint` is not an absolute http(s) URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.api_endpoint = parse_endpoint(endpoint)
            .map_err(|e| ConfigError::InvalidEnvVar("QKART_API_ENDPOINT".to_string(), e))?;
        Ok(self)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an API endpoint, normalizing it to end with a slash so that
/// relative paths like `products` join underneath it.
fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a numeric environment variable with a default value.
fn get_parsed_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_appends_slash() {
        let url = parse_endpoint("http://localhost:8082/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8082/api/v1/");
        assert_eq!(
            url.join("products").unwrap().as_str(),
            "http://localhost:8082/api/v1/products"
        );
    }

    #[test]
    fn test_parse_endpoint_keeps_trailing_slash() {
        let url = parse_endpoint("https://qkart.example.com/api/v1/").unwrap();
        assert_eq!(url.as_str(), "https://qkart.example.com/api/v1/");
    }

    #[test]
    fn test_parse_endpoint_rejects_non_http() {
        assert!(parse_endpoint("ftp://example.com").is_err());
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = StorefrontConfig::default();
        assert_eq!(
            config.api_endpoint.as_str(),
            "http://localhost:8082/api/v1/"
        );
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.token_file.is_none());
    }

    #[test]
    fn test_with_endpoint() {
        let config = StorefrontConfig::default()
            .with_endpoint("http://127.0.0.1:9000/api/v1")
            .unwrap();
        assert_eq!(config.api_endpoint.as_str(), "http://127.0.0.1:9000/api/v1/");

        assert!(StorefrontConfig::default().with_endpoint("nope").is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidEnvVar("QKART_SEARCH_DEBOUNCE_MS".to_string(), "bad".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable QKART_SEARCH_DEBOUNCE_MS: bad"
        );
    }
}
