//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BITEBOX_API_BASE_URL` (or `BITEBOX_API_URL`) - Backend base URL (default: `http://localhost:4003/api`)
//! - `BITEBOX_FALLBACK_BASE_URL` - Base URL retried once after a transport failure (default: `http://localhost:4003/api`)
//! - `BITEBOX_REQUEST_TIMEOUT_SECS` - Per-request deadline (default: 30)
//! - `BITEBOX_TAX_RATE` - Fractional VAT rate applied to cart subtotals (default: 0.075)
//! - `BITEBOX_CATALOG_CACHE_TTL_SECS` - Restaurant/menu cache lifetime (default: 300)
//! - `BITEBOX_DATA_DIR` - Directory for the persisted session (default: `.bitebox`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bitebox_core::TaxRate;
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Backend base URL used when nothing is configured, and the fallback target
/// for transport failures.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4003/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_DATA_DIR: &str = ".bitebox";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Bitebox client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Primary backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// Base URL retried once when the primary is unreachable.
    pub fallback_base_url: String,
    /// Deadline applied to every HTTP request.
    pub request_timeout: Duration,
    /// VAT applied to cart subtotals.
    pub tax_rate: TaxRate,
    /// How long restaurant lists and menus stay cached.
    pub catalog_cache_ttl: Duration,
    /// Where the file-backed session store lives.
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            fallback_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            tax_rate: TaxRate::DEFAULT,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = match lookup("BITEBOX_API_BASE_URL").or_else(|| lookup("BITEBOX_API_URL"))
        {
            Some(raw) => normalize_base_url("BITEBOX_API_BASE_URL", &raw)?,
            None => defaults.api_base_url,
        };
        let fallback_base_url = match lookup("BITEBOX_FALLBACK_BASE_URL") {
            Some(raw) => normalize_base_url("BITEBOX_FALLBACK_BASE_URL", &raw)?,
            None => defaults.fallback_base_url,
        };
        let request_timeout = lookup("BITEBOX_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_var::<u64>("BITEBOX_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?
            .map_or(defaults.request_timeout, Duration::from_secs);
        let catalog_cache_ttl = lookup("BITEBOX_CATALOG_CACHE_TTL_SECS")
            .map(|raw| parse_var::<u64>("BITEBOX_CATALOG_CACHE_TTL_SECS", &raw))
            .transpose()?
            .map_or(defaults.catalog_cache_ttl, Duration::from_secs);
        let tax_rate = match lookup("BITEBOX_TAX_RATE") {
            Some(raw) => {
                let rate = parse_var::<Decimal>("BITEBOX_TAX_RATE", &raw)?;
                TaxRate::new(rate).map_err(|e| {
                    ConfigError::InvalidEnvVar("BITEBOX_TAX_RATE".to_string(), e.to_string())
                })?
            }
            None => defaults.tax_rate,
        };
        let data_dir = lookup("BITEBOX_DATA_DIR").map_or(defaults.data_dir, PathBuf::from);

        Ok(Self {
            api_base_url,
            fallback_base_url,
            request_timeout,
            tax_rate,
            catalog_cache_ttl,
            data_dir,
        })
    }

    /// Whether a transport failure against the primary base should be
    /// retried against the fallback.
    #[must_use]
    pub fn has_distinct_fallback(&self) -> bool {
        self.api_base_url != self.fallback_base_url
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate a base URL and strip any trailing slash.
fn normalize_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(trimmed.to_string())
}
