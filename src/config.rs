//! Configuration module for filevault.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{Result, VaultError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins (empty = any origin, no credentials).
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Scan requests allowed per client IP per minute.
    #[serde(default = "default_scan_rate_limit")]
    pub scan_rate_limit: u32,
    /// Key the scan limiter on `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_scan_rate_limit() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            scan_rate_limit: default_scan_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/filevault.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file (empty = console only).
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filevault.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Hosted storage backend configuration (URL signing).
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the hosted project, e.g. `https://xyz.example.co`.
    #[serde(default)]
    pub base_url: String,
    /// Bucket holding user files.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Service key sent as bearer token to the signing endpoint.
    #[serde(default)]
    pub service_key: String,
    /// Lifetime requested for signed URLs, in seconds.
    #[serde(default = "default_signed_url_expiry")]
    pub signed_url_expiry_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_storage_timeout")]
    pub timeout_secs: u64,
}

fn default_bucket() -> String {
    "files".to_string()
}

fn default_signed_url_expiry() -> u64 {
    3600
}

fn default_storage_timeout() -> u64 {
    15
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bucket: default_bucket(),
            service_key: String::new(),
            signed_url_expiry_secs: default_signed_url_expiry(),
            timeout_secs: default_storage_timeout(),
        }
    }
}

/// Preview cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// How long a signed URL stays in the cache, in seconds.
    #[serde(default = "default_preview_ttl")]
    pub ttl_secs: u64,
}

fn default_preview_ttl() -> u64 {
    30 * 60
}

impl PreviewConfig {
    /// Cache TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_preview_ttl(),
        }
    }
}

/// Remote scan (reputation service) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Base URL of the reputation API.
    #[serde(default = "default_scan_base_url")]
    pub base_url: String,
    /// API key for the reputation service.
    #[serde(default)]
    pub api_key: String,
    /// Delay before the first result fetch, in milliseconds.
    #[serde(default = "default_scan_initial_delay")]
    pub initial_delay_ms: u64,
    /// Upper bound for the backoff delay, in milliseconds.
    #[serde(default = "default_scan_max_delay")]
    pub max_delay_ms: u64,
    /// Maximum number of result fetches before reporting "pending".
    #[serde(default = "default_scan_max_attempts")]
    pub max_attempts: u32,
    /// Total request timeout in seconds.
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,
}

fn default_scan_base_url() -> String {
    "https://www.virustotal.com/api/v3".to_string()
}

fn default_scan_initial_delay() -> u64 {
    5000
}

fn default_scan_max_delay() -> u64 {
    20000
}

fn default_scan_max_attempts() -> u32 {
    4
}

fn default_scan_timeout() -> u64 {
    30
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_url: default_scan_base_url(),
            api_key: String::new(),
            initial_delay_ms: default_scan_initial_delay(),
            max_delay_ms: default_scan_max_delay(),
            max_attempts: default_scan_max_attempts(),
            timeout_secs: default_scan_timeout(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Secret the hosted auth system signs access tokens with.
    #[serde(default)]
    pub jwt_secret: String,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Preview cache configuration.
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Remote scan configuration.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| VaultError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides for secrets.
    ///
    /// - `FILEVAULT_JWT_SECRET` → `auth.jwt_secret`
    /// - `FILEVAULT_STORAGE_KEY` → `storage.service_key`
    /// - `FILEVAULT_SCAN_API_KEY` → `scan.api_key`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 3] = [
            ("FILEVAULT_JWT_SECRET", &mut self.auth.jwt_secret),
            ("FILEVAULT_STORAGE_KEY", &mut self.storage.service_key),
            ("FILEVAULT_SCAN_API_KEY", &mut self.scan.api_key),
        ];
        for (var, target) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *target = value;
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(VaultError::Config(
                "auth.jwt_secret is not set. \
                 Set it in config.toml or via FILEVAULT_JWT_SECRET."
                    .to_string(),
            ));
        }
        if self.storage.base_url.is_empty() {
            return Err(VaultError::Config("storage.base_url is not set".to_string()));
        }
        if self.scan.max_attempts == 0 {
            return Err(VaultError::Config(
                "scan.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.preview.ttl_secs == 0 {
            return Err(VaultError::Config(
                "preview.ttl_secs must be greater than 0".to_string(),
            ));
        }
        if self.storage.signed_url_expiry_secs == 0 {
            return Err(VaultError::Config(
                "storage.signed_url_expiry_secs must be greater than 0".to_string(),
            ));
        }
        // Cached URLs must still be valid when handed out.
        if self.preview.ttl_secs >= self.storage.signed_url_expiry_secs {
            return Err(VaultError::Config(format!(
                "preview.ttl_secs ({}) must be shorter than storage.signed_url_expiry_secs ({})",
                self.preview.ttl_secs, self.storage.signed_url_expiry_secs
            )));
        }
        Ok(())
    }
}
