/**
 * Server Configuration
 *
 * Loads the edge server's settings from the environment, with an optional
 * TOML file describing the cache worker.
 *
 * # Configuration Sources
 *
 * - `ORIGIN_URL` - storefront origin the proxy fronts (default `http://127.0.0.1:3000`)
 * - `SERVER_PORT` - listening port (default `8080`)
 * - `LUXEMARKET_WORKER_CONFIG` - path to a TOML file with `WorkerConfig` fields
 * - `LUXEMARKET_CONTROL_TOKEN` - bearer token for worker control messages
 *   (unset: loopback clients only)
 *
 * Missing values fall back to defaults; malformed values are errors.
 */

use std::path::Path;

use reqwest::Url;

use crate::backend::worker::WorkerConfig;
use crate::shared::ConfigError;

pub const ORIGIN_URL_ENV: &str = "ORIGIN_URL";
pub const SERVER_PORT_ENV: &str = "SERVER_PORT";
pub const WORKER_CONFIG_ENV: &str = "LUXEMARKET_WORKER_CONFIG";
pub const CONTROL_TOKEN_ENV: &str = "LUXEMARKET_CONTROL_TOKEN";

pub const DEFAULT_ORIGIN_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Edge server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Origin every request is proxied to
    pub origin: Url,
    /// Port the proxy listens on
    pub port: u16,
    /// Cache worker settings
    pub worker: WorkerConfig,
    /// Token required on control messages
    pub control_token: Option<String>,
}

impl ServerConfig {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            port: DEFAULT_SERVER_PORT,
            worker: WorkerConfig::default(),
            control_token: None,
        }
    }

    pub fn with_control_token(mut self, token: impl Into<String>) -> Self {
        self.control_token = Some(token.into());
        self
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let origin = std::env::var(ORIGIN_URL_ENV).unwrap_or_else(|_| DEFAULT_ORIGIN_URL.to_string());
        let origin = parse_origin(&origin)?;

        let port = match std::env::var(SERVER_PORT_ENV) {
            Ok(port) => port.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                field: "SERVER_PORT",
                message: format!("{}: {}", port, e),
            })?,
            Err(_) => DEFAULT_SERVER_PORT,
        };

        let worker = match std::env::var(WORKER_CONFIG_ENV) {
            Ok(path) => load_worker_config(Path::new(&path))?,
            Err(_) => WorkerConfig::default(),
        };

        let control_token = std::env::var(CONTROL_TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());

        tracing::debug!(
            "Loaded server configuration: origin={}, port={}, control token {}",
            origin,
            port,
            if control_token.is_some() { "set" } else { "unset" }
        );
        Ok(Self {
            origin,
            port,
            worker,
            control_token,
        })
    }
}

fn parse_origin(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl(value.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(value.to_string()));
    }
    Ok(url)
}

/// Read a worker TOML file; absent keys keep their defaults
pub fn load_worker_config(path: &Path) -> Result<WorkerConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: WorkerConfig = toml::from_str(&contents)?;
    if config.cache_name.trim().is_empty() {
        return Err(ConfigError::MissingValue("cache_name"));
    }
    if !config.offline_route.starts_with('/') {
        return Err(ConfigError::InvalidValue {
            field: "offline_route",
            message: format!("{} is not an absolute path", config.offline_route),
        });
    }
    tracing::info!("Loaded worker configuration from {}", path.display());
    Ok(config)
}
