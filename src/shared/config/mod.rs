//! Application configuration module
//!
//! Provides configuration types for the storefront core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::shared::pricing::PricingRules;

/// Catalog API used when nothing else is configured
pub const DEFAULT_CATALOG_URL: &str = "https://fakestoreapi.com";

/// Key the persisted store blob is written under
pub const DEFAULT_STORAGE_KEY: &str = "ecommerce-store";

/// Catalog responses are revalidated hourly
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(3600);

/// Directory name under the platform data directory
pub const DATA_DIR_NAME: &str = "luxemarket";

/// `<data-local-dir>/luxemarket`, if the platform has one
pub fn default_storage_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(DATA_DIR_NAME))
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Catalog API base URL
    pub catalog_url: String,
    /// Directory for durable client state; `None` keeps state in memory
    ///
    /// Defaults to [`default_storage_dir`].
    pub storage_dir: Option<PathBuf>,
    /// Storage key for the persisted store
    pub storage_key: String,
    /// How long catalog responses are served before revalidation
    pub catalog_ttl: Duration,
    /// Shipping and tax rules
    pub pricing: PricingRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            storage_dir: default_storage_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            catalog_ttl: DEFAULT_CATALOG_TTL,
            pricing: PricingRules::default(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.catalog_url.starts_with("http://") || self.catalog_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.catalog_url.clone()));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("storage_key"));
        }
        if self.pricing.tax_rate.is_sign_negative() || self.pricing.flat_shipping.is_sign_negative() {
            return Err(ConfigError::InvalidValue {
                field: "pricing",
                message: "rates and fees must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    catalog_url: Option<String>,
    storage_dir: Option<PathBuf>,
    in_memory: bool,
    storage_key: Option<String>,
    catalog_ttl: Option<Duration>,
    pricing: Option<PricingRules>,
}

impl AppConfigBuilder {
    /// Set the catalog API base URL
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Persist client state under this directory
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Keep client state in memory only; nothing survives a restart
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Override the storage key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    /// Override the catalog revalidation interval
    pub fn catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_ttl = Some(ttl);
        self
    }

    /// Override pricing rules
    pub fn pricing(mut self, pricing: PricingRules) -> Self {
        self.pricing = Some(pricing);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            catalog_url: self
                .catalog_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.catalog_url),
            storage_dir: if self.in_memory {
                None
            } else {
                self.storage_dir.or(defaults.storage_dir)
            },
            storage_key: self.storage_key.unwrap_or(defaults.storage_key),
            catalog_ttl: self.catalog_ttl.unwrap_or(defaults.catalog_ttl),
            pricing: self.pricing.unwrap_or(defaults.pricing),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
