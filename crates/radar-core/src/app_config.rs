use std::path::PathBuf;

use crate::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub app_name: String,
    pub cache_dir: PathBuf,
    pub partners_path: PathBuf,
    pub admin_passcode: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    pub storage_bucket: String,
    pub storage_prefix: String,
    pub gemini_api_key: Option<String>,
    pub geocode_model: String,
    pub geocode_fallback_model: String,
    pub home_region: String,
    pub home: Coordinates,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_retry_backoff_ms: u64,
}

impl AppConfig {
    /// Key of the local cache entry holding the last-known landing config.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}_config", self.app_name)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("app_name", &self.app_name)
            .field("cache_dir", &self.cache_dir)
            .field("partners_path", &self.partners_path)
            .field("database_url", &"[redacted]")
            .field("admin_passcode", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("storage_url", &self.storage_url)
            .field(
                "storage_key",
                &self.storage_key.as_ref().map(|_| "[redacted]"),
            )
            .field("storage_bucket", &self.storage_bucket)
            .field("storage_prefix", &self.storage_prefix)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("geocode_model", &self.geocode_model)
            .field("geocode_fallback_model", &self.geocode_fallback_model)
            .field("home_region", &self.home_region)
            .field("home", &self.home)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_max_retries", &self.http_max_retries)
            .field("http_retry_backoff_ms", &self.http_retry_backoff_ms)
            .finish()
    }
}
