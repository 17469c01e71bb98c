use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, error, warn};

use super::AppConfig;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    fn load_from_file() -> Self {
        let config_paths = [
            "config.toml",
            "linkpress.toml",
            "config/config.toml",
            "/etc/linkpress/config.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<AppConfig>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            } else {
                error!("Invalid SERVER_PORT: {}", port);
            }
        }

        // Database config
        if let Ok(backend) = env::var("DATABASE_BACKEND") {
            self.database.backend = backend;
        }
        if let Ok(database_url) = env::var("DATABASE_URL") {
            self.database.database_url = database_url;
        }

        // App config
        if let Ok(base_url) = env::var("PUBLIC_BASE_URL") {
            self.app.public_base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(random_code_length) = env::var("RANDOM_CODE_LENGTH") {
            if let Ok(length) = random_code_length.parse() {
                self.app.random_code_length = length;
            } else {
                error!("Invalid RANDOM_CODE_LENGTH: {}", random_code_length);
            }
        }

        // CORS config
        if let Ok(enabled) = env::var("CORS_ENABLED") {
            self.cors.enabled = enabled == "true";
        }
        if let Ok(origins) = env::var("CORS_ALLOWED_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Collector config
        if let Ok(endpoint) = env::var("COLLECTOR_ENDPOINT") {
            self.collector.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Ok(client_id) = env::var("COLLECTOR_CLIENT_ID") {
            self.collector.client_id = client_id;
        }
        if let Ok(client_secret) = env::var("COLLECTOR_CLIENT_SECRET") {
            self.collector.client_secret = client_secret;
        }

        // Logging config
        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }
        if let Ok(log_file) = env::var("LOG_FILE") {
            self.logging.file = log_file;
        }
        if let Ok(log_format) = env::var("LOG_FORMAT") {
            self.logging.format = log_format;
        }
    }
}

/// Get the global configuration instance
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::load)
}

/// Initialize the global configuration
pub fn init_config() {
    CONFIG.get_or_init(AppConfig::load);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.app.random_code_length, 7);
        assert!(!config.collector.is_enabled());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.server.host, config.server.host);
        assert_eq!(parsed.app.public_base_url, config.app.public_base_url);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[server]\nport = 9001\n").unwrap();
        assert_eq!(parsed.server.port, 9001);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.database.backend, "sqlite");
    }
}
