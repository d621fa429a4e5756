use std::path::Path;
use std::sync::Arc;

use crate::client::store::{FileStorage, MemoryStorage, StatePersistence, StorageBackend};
use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Environment variable overriding the catalog API base URL
pub const CATALOG_URL_ENV: &str = "CATALOG_API_URL";

/// Environment variable naming the directory for durable client state
pub const DATA_DIR_ENV: &str = "LUXEMARKET_DATA_DIR";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid client environment: {}", e);
            Self { app: AppConfig::default() }
        })
    }
}

impl Config {
    /// Create a new configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `CATALOG_API_URL` and `LUXEMARKET_DATA_DIR`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = AppConfig::builder();
        if let Ok(url) = std::env::var(CATALOG_URL_ENV) {
            builder = builder.catalog_url(url);
        }
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            builder = builder.storage_dir(dir);
        }
        Self::with_builder(builder)
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        Ok(Self { app: builder.build()? })
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Get the full URL for a catalog endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.catalog_url(), path)
    }

    pub fn catalog_url(&self) -> &str {
        &self.app.catalog_url
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.app.storage_dir.as_deref()
    }

    /// Persistence for the store: on disk unless configured in memory
    pub fn persistence(&self) -> StatePersistence {
        let backend: Arc<dyn StorageBackend> = match self.storage_dir() {
            Some(dir) => Arc::new(FileStorage::new(dir)),
            None => Arc::new(MemoryStorage::new()),
        };
        StatePersistence::new(backend, self.app.storage_key.clone())
    }
}
