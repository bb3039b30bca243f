use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project configuration file, created by `agentdeck init`
pub const PROJECT_CONFIG_FILE: &str = ".agentdeck/config.yaml";

/// Optional local overrides
pub const LOCAL_CONFIG_FILE: &str = ".agentdeck/local.yaml";

/// Prefix for environment overrides, e.g. `AGENTDECK_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "AGENTDECK_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid port range: {0}-{1}. Start must be non-zero and not exceed end")]
    InvalidPortRange(u16, u16),

    #[error("Invalid {0}: must be at least 1 second")]
    InvalidTimeout(&'static str),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .agentdeck/config.yaml
    /// 3. .agentdeck/local.yaml (optional)
    /// 4. `explicit` file, when given
    /// 5. Environment variables (AGENTDECK_* prefix, `__` separates nesting)
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        let config: Config = Self::figment(explicit)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// The merged provider stack used by [`ConfigLoader::load`].
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE));

        if let Some(path) = explicit {
            figment = figment.merge(Yaml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        let deployment = &config.deployment;
        if deployment.port_range_start == 0 || deployment.port_range_start > deployment.port_range_end {
            return Err(ConfigError::InvalidPortRange(
                deployment.port_range_start,
                deployment.port_range_end,
            ));
        }

        if deployment.provision_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("provision_timeout_secs"));
        }
        if deployment.install_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("install_timeout_secs"));
        }

        if deployment.python.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "deployment.python cannot be empty".to_string(),
            ));
        }
        if deployment.base_package.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "deployment.base_package cannot be empty".to_string(),
            ));
        }
        if deployment.script_name.is_empty() || deployment.script_name.contains(['/', '\\']) {
            return Err(ConfigError::ValidationFailed(format!(
                "deployment.script_name must be a plain file name, got '{}'",
                deployment.script_name
            )));
        }

        Ok(())
    }
}
