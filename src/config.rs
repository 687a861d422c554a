//! Configuration for the PocketGear service

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Connection settings for the catalog store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the PostgREST endpoint
    pub url: String,
    /// API key, sent as `apikey` and as the bearer token
    pub key: String,
    /// Schema profile holding the `products` table
    pub database: String,
    pub request_timeout: Duration,
}

/// Configuration options for the service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address
    pub bind_addr: String,

    pub store_url: Option<String>,

    pub store_key: Option<String>,

    /// The named database
    pub database: String,

    /// Request timeout of the store and auth server clients
    pub store_timeout: Duration,

    /// Fallback snapshot file
    pub snapshot_path: PathBuf,

    /// HS256 secret for verifying access tokens locally
    pub jwt_secret: Option<String>,

    /// Expected `aud` claim, when set
    pub jwt_audience: Option<String>,

    /// Auth server used when no secret is configured
    pub auth_url: Option<String>,

    pub auth_key: Option<String>,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            store_url: None,
            store_key: None,
            database: "pocketgear".to_string(),
            store_timeout: Duration::from_secs(10),
            snapshot_path: PathBuf::from("public/data.json"),
            jwt_secret: None,
            jwt_audience: None,
            auth_url: None,
            auth_key: None,
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Read the configuration from `POCKETGEAR_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any name-to-value lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(bind) = get("POCKETGEAR_BIND") {
            config.bind_addr = bind;
        }
        config.store_url = get("POCKETGEAR_STORE_URL");
        config.store_key = get("POCKETGEAR_STORE_KEY");
        if let Some(database) = get("POCKETGEAR_DATABASE") {
            config.database = database;
        }
        if let Some(raw) = get("POCKETGEAR_STORE_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                name: "POCKETGEAR_STORE_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.store_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = get("POCKETGEAR_SNAPSHOT_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }
        config.jwt_secret = get("POCKETGEAR_JWT_SECRET");
        config.jwt_audience = get("POCKETGEAR_JWT_AUDIENCE");
        config.auth_url = get("POCKETGEAR_AUTH_URL");
        config.auth_key = get("POCKETGEAR_AUTH_KEY");
        if let Some(raw) = get("POCKETGEAR_LOG_JSON") {
            config.log_json = parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                name: "POCKETGEAR_LOG_JSON",
                value: raw,
            })?;
        }

        Ok(config)
    }

    /// Store settings, or `None` when the URL or the key is missing
    pub fn store_config(&self) -> Option<StoreConfig> {
        Some(StoreConfig {
            url: self.store_url.clone()?,
            key: self.store_key.clone()?,
            database: self.database.clone(),
            request_timeout: self.store_timeout,
        })
    }

    /// Set the store URL and key
    pub fn with_store(mut self, url: &str, key: &str) -> Self {
        self.store_url = Some(url.to_string());
        self.store_key = Some(key.to_string());
        self
    }

    pub fn with_database(mut self, value: &str) -> Self {
        self.database = value.to_string();
        self
    }

    pub fn with_store_timeout(mut self, value: Duration) -> Self {
        self.store_timeout = value;
        self
    }

    pub fn with_snapshot_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.snapshot_path = value.into();
        self
    }

    pub fn with_jwt_secret(mut self, value: &str) -> Self {
        self.jwt_secret = Some(value.to_string());
        self
    }

    pub fn with_auth_url(mut self, url: &str, key: Option<&str>) -> Self {
        self.auth_url = Some(url.to_string());
        self.auth_key = key.map(str::to_string);
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
