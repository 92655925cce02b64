//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BAKERY_API_URL` - Backend REST base URL (default: `http://localhost:8080/api`)
//! - `BAKERY_API_TOKEN` - Bearer token sent to the backend
//! - `BAKERY_HTTP_TIMEOUT_SECS` - Request timeout (default: client default)
//! - `BAKERY_CART_FILE` - Where the cart is persisted (default: `.bakery/cart.json`)
//! - `BAKERY_DELIVERY_CITY` - Delivery city (default: Lima)
//! - `BAKERY_DELIVERY_STATE` - Delivery region (default: Lima)
//! - `BAKERY_DELIVERY_COUNTRY` - Delivery country (default: Perú)
//! - `BAKERY_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 50)
//! - `BAKERY_FLAT_SHIPPING_FEE` - Shipping below the threshold (default: 5)
//! - `BAKERY_TAX_RATE` - Tax rate as a fraction (default: 0.10)
//! - `PAYMENTS_PUBLISHABLE_KEY` - Card processor publishable key
//! - `PAYMENTS_API_URL` - Card processor API (default: `https://api.stripe.com`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bakery_core::{DeliveryArea, Money, PricingPolicy};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_PAYMENTS_API_URL: &str = "https://api.stripe.com";
const DEFAULT_CART_FILE: &str = ".bakery/cart.json";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend REST API configuration
    pub api: ApiConfig,
    /// Card processor configuration
    pub payments: PaymentsConfig,
    /// Durable cart storage location
    pub cart_file: PathBuf,
    /// Fixed delivery area
    pub delivery_area: DeliveryArea,
    /// Shipping and tax policy shared with the backend
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, without trailing slash
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Optional request timeout
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Card processor configuration.
///
/// Implements `Debug` manually to redact the publishable key.
#[derive(Clone)]
pub struct PaymentsConfig {
    /// Processor API base URL
    pub api_url: Url,
    /// Publishable key; card payments are unavailable without it
    pub publishable_key: Option<SecretString>,
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("api_url", &self.api_url.as_str())
            .field(
                "publishable_key",
                &self.publishable_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or if a secret fails
    /// validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;
        let payments = PaymentsConfig::from_env()?;
        let cart_file = PathBuf::from(get_env_or_default("BAKERY_CART_FILE", DEFAULT_CART_FILE));

        let defaults = DeliveryArea::default();
        let delivery_area = DeliveryArea {
            city: get_env_or_default("BAKERY_DELIVERY_CITY", &defaults.city),
            state: get_env_or_default("BAKERY_DELIVERY_STATE", &defaults.state),
            country: get_env_or_default("BAKERY_DELIVERY_COUNTRY", &defaults.country),
        };

        let pricing = pricing_from_env()?;

        Ok(Self {
            api,
            payments,
            cart_file,
            delivery_area,
            pricing,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at explicit endpoints, with defaults elsewhere.
    #[must_use]
    pub fn new(api_url: Url, payments_url: Url) -> Self {
        Self {
            api: ApiConfig {
                base_url: api_url,
                token: None,
                timeout: None,
            },
            payments: PaymentsConfig {
                api_url: payments_url,
                publishable_key: None,
            },
            cart_file: PathBuf::from(DEFAULT_CART_FILE),
            delivery_area: DeliveryArea::default(),
            pricing: PricingPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_url("BAKERY_API_URL", DEFAULT_API_URL)?;
        let token = get_optional_env("BAKERY_API_TOKEN")
            .map(|value| {
                validate_secret_strength(&value, "BAKERY_API_TOKEN")?;
                Ok(SecretString::from(value))
            })
            .transpose()?;
        let timeout = get_optional_env("BAKERY_HTTP_TIMEOUT_SECS")
            .map(|value| {
                value.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("BAKERY_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;

        Ok(Self {
            base_url,
            token,
            timeout,
        })
    }
}

impl PaymentsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let publishable_key = get_optional_env("PAYMENTS_PUBLISHABLE_KEY")
            .map(|value| {
                validate_secret_strength(&value, "PAYMENTS_PUBLISHABLE_KEY")?;
                Ok(SecretString::from(value))
            })
            .transpose()?;

        Ok(Self {
            api_url: get_url("PAYMENTS_API_URL", DEFAULT_PAYMENTS_API_URL)?,
            publishable_key,
        })
    }
}

fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let defaults = PricingPolicy::default();

    let free_shipping_threshold = get_optional_decimal("BAKERY_FREE_SHIPPING_THRESHOLD")?
        .map_or(defaults.free_shipping_threshold, Money::new);
    let flat_shipping_fee = get_optional_decimal("BAKERY_FLAT_SHIPPING_FEE")?
        .map_or(defaults.flat_shipping_fee, Money::new);
    let tax_rate = get_optional_decimal("BAKERY_TAX_RATE")?.unwrap_or(defaults.tax_rate);

    if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            "BAKERY_TAX_RATE".to_string(),
            format!("must be a fraction in [0, 1), got {tax_rate}"),
        ));
    }

    Ok(PricingPolicy {
        free_shipping_threshold,
        flat_shipping_fee,
        tax_rate,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get a URL from the environment, stripping trailing slashes.
fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = get_env_or_default(key, default);
    parse_base_url(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

/// Parse a base URL, stripping trailing slashes.
///
/// # Errors
///
/// Returns a description of the problem if the URL is not an http(s) base.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim().trim_end_matches('/')).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(format!("not an http(s) base URL: {raw}"));
    }
    Ok(url)
}

/// Get an optional decimal from the environment.
fn get_optional_decimal(key: &str) -> Result<Option<Decimal>, ConfigError> {
    get_optional_env(key)
        .map(|value| {
            let amount = Decimal::from_str(value.trim())
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
            if amount.is_sign_negative() {
                return Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    "must not be negative".to_string(),
                ));
            }
            Ok(amount)
        })
        .transpose()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real tokens and keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value issued by the provider."
            ),
        ));
    }

    Ok(())
}
