use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure for agentdeck
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Local deployment pipeline configuration
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Association validation policy
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_server_port() -> u16 {
    8000
}

const fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_server_port(),
            enable_cors: default_true(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".agentdeck/agentdeck.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl DatabaseConfig {
    /// sqlx connection URL for the configured path
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation policy for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,

    #[serde(default = "default_true")]
    pub enable_stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
            enable_stdout: default_true(),
        }
    }
}

/// Local deployment pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeploymentConfig {
    /// Parent directory for per-deployment environments
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Interpreter used to create isolated environments
    #[serde(default = "default_python")]
    pub python: String,

    /// Runtime package installed into every environment before tool packages
    #[serde(default = "default_base_package")]
    pub base_package: String,

    /// File name of the generated agent script
    #[serde(default = "default_script_name")]
    pub script_name: String,

    /// First port handed out to running deployments
    #[serde(default = "default_port_range_start")]
    pub port_range_start: u16,

    /// Last port handed out to running deployments (inclusive)
    #[serde(default = "default_port_range_end")]
    pub port_range_end: u16,

    /// Upper bound for environment creation
    #[serde(default = "default_provision_timeout_secs")]
    pub provision_timeout_secs: u64,

    /// Upper bound for the batch package install
    #[serde(default = "default_install_timeout_secs")]
    pub install_timeout_secs: u64,

    /// Service endpoint variables written at the top of every script
    #[serde(default = "default_bootstrap_env")]
    pub bootstrap_env: BTreeMap<String, String>,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./deployments")
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_base_package() -> String {
    "google-adk".to_string()
}

fn default_script_name() -> String {
    "agent.py".to_string()
}

const fn default_port_range_start() -> u16 {
    8100
}

const fn default_port_range_end() -> u16 {
    8199
}

const fn default_provision_timeout_secs() -> u64 {
    300
}

const fn default_install_timeout_secs() -> u64 {
    1800
}

fn default_bootstrap_env() -> BTreeMap<String, String> {
    [
        ("BASE_URL", "https://api.example.com"),
        ("CERTS_PATH", "/path/to/certs"),
        ("APIGEE_URL", "https://apigee.example.com"),
        ("USE_API_GATEWAY", "true"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            python: default_python(),
            base_package: default_base_package(),
            script_name: default_script_name(),
            port_range_start: default_port_range_start(),
            port_range_end: default_port_range_end(),
            provision_timeout_secs: default_provision_timeout_secs(),
            install_timeout_secs: default_install_timeout_secs(),
            bootstrap_env: default_bootstrap_env(),
        }
    }
}

/// Association validation policy
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct ValidationConfig {
    /// Reject extra environment variables even for tools that declare none.
    ///
    /// Off by default: a tool without required variables accepts any mapping.
    #[serde(default)]
    pub reject_unknown_without_requirements: bool,
}
