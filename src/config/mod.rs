//! Configuration management for repohub
//!
//! Layered configuration loaded from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file (default: `config/repohub.toml`, overridable
//!    via the `REPOHUB_CONFIG` environment variable)
//! 3. Environment variables with the pattern `REPOHUB__<section>__<key>`
//!    (highest priority), e.g. `REPOHUB__SERVER__BIND_ADDR=0.0.0.0:9000`.

mod models;
mod sources;

pub use models::{ClientConfig, Config, ServerConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from all sources (file + environment).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.users.is_empty() && !config.server.anonymous_allowed {
        return Err(ConfigError::ValidationError(
            "no users configured and anonymous access disabled; nobody could authenticate"
                .to_string(),
        ));
    }
    if config.client.base_url.trim_end_matches('/').is_empty() {
        return Err(ConfigError::ValidationError("client.base_url is empty".to_string()));
    }
    if config.client.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "client.request_timeout_secs must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validation_rejects_unusable_auth_setup() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        // No users, anonymous disabled: nobody could ever authenticate.
        let toml_content = r#"
[server]
anonymous_allowed = false
        "#;
        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_minimal_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server.users]
admin = "admin123"
        "#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.server.users.len(), 1);
    }
}
