//! Application configuration
//!
//! Configuration is loaded once at startup from a TOML file (first match
//! among a few well-known paths) and then overridden by environment
//! variables. Access goes through the global [`get_config`].

mod r#impl;

pub use r#impl::{get_config, init_config};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppSettings,
    pub cors: CorsConfig,
    pub collector: CollectorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlite, mysql or postgres
    pub backend: String,
    pub database_url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            database_url: "sqlite://links.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Base used to assemble returned shortlinks, without trailing slash
    pub public_base_url: String,
    pub random_code_length: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:8000".to_string(),
            random_code_length: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    /// Allowed origins; "*" allows any origin
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allow_credentials: true,
            max_age: 3600,
        }
    }
}

/// Remote log collector settings. An empty endpoint disables remote
/// logging entirely; the service then logs locally only.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CollectorConfig {
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CollectorConfig {
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Empty = stdout
    pub file: String,
    /// "plain" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: String::new(),
            format: "plain".to_string(),
        }
    }
}
