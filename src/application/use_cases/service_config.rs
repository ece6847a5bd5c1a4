use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::application::use_cases::aggregator::DEFAULT_CHUNK_SIZE;
use crate::application::use_cases::ingestion::{DEFAULT_MAX_ROWS, MAX_ROWS_CEILING, MIN_ROWS_FLOOR};
use crate::application::use_cases::rate_limiter::RateLimitConfig;

/// Service configuration with all tunable parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    // HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    // Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    // Rate limiting for mutating routes
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    // Ingestion defaults applied when requests omit them
    #[serde(default)]
    pub ingestion: IngestionDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionDefaults {
    /// Row cap applied when an import request omits one
    #[serde(default = "default_max_rows")]
    pub default_max_rows: usize,

    /// Persistence chunk size in records
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    /// Records echoed back in import and generate reports
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8088
}

fn default_db_path() -> String {
    "phishguard.db".to_string()
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_sample_size() -> usize {
    5
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            rate_limit: RateLimitConfig::default(),
            ingestion: IngestionDefaults::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for IngestionDefaults {
    fn default() -> Self {
        Self {
            default_max_rows: default_max_rows(),
            default_chunk_size: default_chunk_size(),
            sample_size: default_sample_size(),
        }
    }
}

/// Validation result for configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ServiceConfig {
    /// Validate configuration values
    pub fn validate(&self) -> ConfigValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // Validate server config
        if self.server.bind_address.trim().is_empty() {
            errors.push("Bind address must not be empty".to_string());
        }
        if self.server.port == 0 {
            errors.push("Port must be greater than 0".to_string());
        }

        // Validate database config
        if self.database.path.trim().is_empty() {
            errors.push("Database path must not be empty".to_string());
        }

        // Validate rate limit config
        if self.rate_limit.max_requests == 0 {
            errors.push("Rate limit max_requests must be at least 1".to_string());
        }
        if self.rate_limit.window_secs <= 0 {
            errors.push("Rate limit window must be at least 1 second".to_string());
        }

        // Validate ingestion defaults
        if self.ingestion.default_chunk_size == 0 {
            errors.push("Chunk size must be at least 1".to_string());
        }
        if self.ingestion.default_chunk_size > 1000 {
            warnings.push("Chunk sizes over 1000 may hold transactions too long".to_string());
        }
        if self.ingestion.default_max_rows < MIN_ROWS_FLOOR
            || self.ingestion.default_max_rows > MAX_ROWS_CEILING
        {
            warnings.push(format!(
                "Row cap {} outside {}..={} will be clamped per request",
                self.ingestion.default_max_rows, MIN_ROWS_FLOOR, MAX_ROWS_CEILING
            ));
        }
        if self.ingestion.sample_size > 100 {
            warnings.push("Sample sizes over 100 bloat import responses".to_string());
        }

        ConfigValidation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Load config from file
    fn load_from_file(path: &Path) -> Option<ServiceConfig> {
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load config from file, falling back to defaults when missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        let validation = config.validate();

        assert!(validation.valid);
        assert!(validation.errors.is_empty());
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.ingestion.default_max_rows, DEFAULT_MAX_ROWS);
        assert_eq!(config.ingestion.default_chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ServiceConfig::default();
        config.server.port = 0;
        config.database.path = "  ".to_string();
        config.rate_limit.max_requests = 0;
        config.ingestion.default_chunk_size = 0;

        let validation = config.validate();

        assert!(!validation.valid);
        assert_eq!(validation.errors.len(), 4);
    }

    #[test]
    fn test_validation_warns_on_extremes() {
        let mut config = ServiceConfig::default();
        config.ingestion.default_chunk_size = 5000;
        config.ingestion.default_max_rows = 100_000;
        config.ingestion.sample_size = 500;

        let validation = config.validate();

        assert!(validation.valid);
        assert_eq!(validation.warnings.len(), 3);
    }

    #[test]
    fn test_load_from_file_roundtrip() {
        let mut file = NamedTempFile::new().unwrap();
        let json = r#"{
            "server": { "bind_address": "0.0.0.0", "port": 9000 },
            "database": { "path": "scans.db" }
        }"#;
        file.write_all(json.as_bytes()).unwrap();

        let config = ServiceConfig::load_or_default(file.path());

        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, "scans.db");
        // Omitted sections keep their defaults
        assert_eq!(config.rate_limit.max_requests, 30);
        assert_eq!(config.ingestion.sample_size, 5);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ServiceConfig::load_or_default(Path::new("does-not-exist.json"));

        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.database.path, "phishguard.db");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();

        let config = ServiceConfig::load_or_default(file.path());

        assert_eq!(config.server.port, 8088);
    }
}
