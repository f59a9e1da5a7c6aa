//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token
//! - `SHOPIFY_CUSTOMER_SHOP_ID` - Customer Account API numeric shop ID
//! - `SHOPIFY_CUSTOMER_CLIENT_ID` - Customer Account API OAuth client ID
//! - `SHOPIFY_CUSTOMER_CLIENT_SECRET` - Customer Account API OAuth client secret
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-01)
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - Full GraphQL endpoint override (proxies, tests)
//! - `GIFT_VARIANT_ID`, `GIFT_THRESHOLD`, `GIFT_CURRENCY` - Gift with purchase
//! - `MEDIA_ACCESS_KEY`, `MEDIA_SECRET_KEY`, `MEDIA_API_BASE_URL`, `MEDIA_MODEL` -
//!   AI image generation
//! - `CDN_CLOUD_NAME`, `CDN_API_KEY`, `CDN_API_SECRET`, `CDN_UPLOAD_FOLDER`,
//!   `CDN_API_BASE_URL` - Signed media uploads
//! - `THEME_BRAND_NAME`, `THEME_ACCENT_COLOR`, `HOME_FEATURED_COLLECTION` - Theme
//! - `GA4_MEASUREMENT_ID` - Google Analytics 4 measurement ID
//! - `META_PIXEL_ID` - Meta (Facebook) pixel ID
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Sentry error tracking
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use tidepool_core::{GiftPolicy, Money, VariantGid};

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

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shopify Storefront and Customer Account API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Gift with purchase promotion, when configured
    pub gift: Option<GiftPolicy>,
    /// AI image generation service, when configured
    pub media: Option<MediaConfig>,
    /// Image CDN for signed uploads, when configured
    pub cdn: Option<CdnConfig>,
    /// Branding and home page content
    pub theme: ThemeConfig,
    /// Analytics tracking configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
    pub log_format: LogFormat,
}

/// Shopify API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
    /// Overrides the derived Storefront API endpoint
    pub storefront_endpoint: Option<String>,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
    /// Customer Account API numeric shop ID (found in Shopify admin URL)
    pub customer_shop_id: String,
    /// Customer Account API OAuth client ID
    pub customer_client_id: String,
    /// Customer Account API OAuth client secret
    pub customer_client_secret: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_endpoint", &self.storefront_endpoint)
            .field("storefront_private_token", &"[REDACTED]")
            .field("customer_shop_id", &self.customer_shop_id)
            .field("customer_client_id", &self.customer_client_id)
            .field("customer_client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// Storefront GraphQL endpoint.
    #[must_use]
    pub fn storefront_endpoint(&self) -> String {
        self.storefront_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}/api/{}/graphql.json",
                self.store, self.api_version
            )
        })
    }
}

/// AI image generation API credentials.
#[derive(Clone)]
pub struct MediaConfig {
    pub api_base_url: String,
    /// Issuer of the signed request token
    pub access_key: String,
    /// HMAC key for the signed request token
    pub secret_key: SecretString,
    pub model: String,
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("api_base_url", &self.api_base_url)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Image CDN credentials.
#[derive(Clone)]
pub struct CdnConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    /// Folder new uploads land in
    pub upload_folder: String,
    /// Upload API host, e.g. `https://api.cloudinary.com`
    pub api_base_url: String,
}

impl std::fmt::Debug for CdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("upload_folder", &self.upload_folder)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Branding shown in the layout and home page.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    pub brand_name: String,
    /// CSS hex color, validated as `#rrggbb`
    pub accent_color: String,
    /// Collection handle featured on the home page
    pub featured_collection: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            brand_name: "Tidepool".to_string(),
            accent_color: "#0f766e".to_string(),
            featured_collection: "frontpage".to_string(),
        }
    }
}

/// Analytics and tracking pixel configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    /// Google Analytics 4 measurement ID
    pub ga4_measurement_id: Option<String>,
    /// Meta (Facebook) pixel ID
    pub meta_pixel_id: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let gift = gift_policy_from_env()?;
        let media = MediaConfig::from_env()?;
        let cdn = CdnConfig::from_env()?;
        let theme = ThemeConfig::from_env()?;
        let analytics = AnalyticsConfig::from_env();

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            gift,
            media,
            cdn,
            theme,
            analytics,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
            log_format: match get_optional_env("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// True when the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2025-01"),
            storefront_endpoint: get_optional_env("SHOPIFY_STOREFRONT_ENDPOINT"),
            storefront_private_token: get_validated_secret("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
            customer_shop_id: get_required_env("SHOPIFY_CUSTOMER_SHOP_ID")?,
            customer_client_id: get_required_env("SHOPIFY_CUSTOMER_CLIENT_ID")?,
            customer_client_secret: get_validated_secret("SHOPIFY_CUSTOMER_CLIENT_SECRET")?,
        })
    }
}

impl MediaConfig {
    /// Enabled by `MEDIA_ACCESS_KEY`; the secret is then required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(access_key) = get_optional_env("MEDIA_ACCESS_KEY") else {
            return Ok(None);
        };
        Ok(Some(Self {
            api_base_url: get_env_or_default("MEDIA_API_BASE_URL", "https://api.klingai.com")
                .trim_end_matches('/')
                .to_string(),
            access_key,
            secret_key: get_validated_secret("MEDIA_SECRET_KEY")?,
            model: get_env_or_default("MEDIA_MODEL", "kling-v1"),
        }))
    }
}

impl CdnConfig {
    /// Enabled by `CDN_CLOUD_NAME`; key and secret are then required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(cloud_name) = get_optional_env("CDN_CLOUD_NAME") else {
            return Ok(None);
        };
        Ok(Some(Self {
            cloud_name,
            api_key: get_required_env("CDN_API_KEY")?,
            api_secret: get_validated_secret("CDN_API_SECRET")?,
            upload_folder: get_env_or_default("CDN_UPLOAD_FOLDER", "storefront"),
            api_base_url: get_env_or_default("CDN_API_BASE_URL", "https://api.cloudinary.com")
                .trim_end_matches('/')
                .to_string(),
        }))
    }
}

impl ThemeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let accent_color = get_env_or_default("THEME_ACCENT_COLOR", &defaults.accent_color);
        if !is_hex_color(&accent_color) {
            return Err(ConfigError::InvalidEnvVar(
                "THEME_ACCENT_COLOR".to_string(),
                format!("expected #rrggbb, got {accent_color}"),
            ));
        }
        Ok(Self {
            brand_name: get_env_or_default("THEME_BRAND_NAME", &defaults.brand_name),
            accent_color,
            featured_collection: get_env_or_default(
                "HOME_FEATURED_COLLECTION",
                &defaults.featured_collection,
            ),
        })
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        Self {
            ga4_measurement_id: get_optional_env("GA4_MEASUREMENT_ID"),
            meta_pixel_id: get_optional_env("META_PIXEL_ID"),
        }
    }
}

/// Enabled by `GIFT_VARIANT_ID`; the threshold is then required.
fn gift_policy_from_env() -> Result<Option<GiftPolicy>, ConfigError> {
    let Some(variant) = get_optional_env("GIFT_VARIANT_ID") else {
        return Ok(None);
    };
    let threshold = get_required_env("GIFT_THRESHOLD")?;
    let currency = get_env_or_default("GIFT_CURRENCY", "USD");
    parse_gift_policy(&variant, &threshold, &currency).map(Some)
}

/// Build a gift policy from raw values. Bare numeric variant IDs are accepted.
fn parse_gift_policy(
    variant: &str,
    threshold: &str,
    currency: &str,
) -> Result<GiftPolicy, ConfigError> {
    let variant_id = match variant.parse::<u64>() {
        Ok(numeric) => VariantGid::from_numeric(numeric),
        Err(_) => VariantGid::parse(variant)
            .map_err(|e| ConfigError::InvalidEnvVar("GIFT_VARIANT_ID".to_string(), e.to_string()))?,
    };
    let threshold = Money::parse(threshold, currency)
        .map_err(|e| ConfigError::InvalidEnvVar("GIFT_THRESHOLD".to_string(), e.to_string()))?;
    if threshold.amount.is_sign_negative() && !threshold.amount.is_zero() {
        return Err(ConfigError::InvalidEnvVar(
            "GIFT_THRESHOLD".to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(GiftPolicy {
        variant_id,
        threshold,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    // Real API keys are random; low entropy means a hand-typed value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
