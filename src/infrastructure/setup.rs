//! Project setup and service wiring
//!
//! - Configuration directory and default config file creation
//! - Database initialization with embedded migrations
//! - Assembly of the HTTP application state from a pool and a config

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::http::AppState;
use crate::adapters::sqlite::{
    initialize_database, PoolConfig, SqliteAgentRepository, SqliteAssociationRepository, SqliteDeploymentRepository,
    SqliteRemoteTargetRepository, SqliteToolRepository,
};
use crate::domain::models::Config;
use crate::domain::ports::AgentRuntime;
use crate::services::{
    AgentService, DeploymentOrchestrator, DeploymentService, EnvValidator, LiveLogRegistry, PortPool,
    RemoteTargetService, ScriptSynthesizer, SynthesisError, ToolService,
};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# agentdeck configuration
# Override settings by editing this file, adding .agentdeck/local.yaml, or
# setting environment variables with the AGENTDECK_ prefix
#
# Example environment variables:
#   export AGENTDECK_SERVER__PORT=9000
#   export AGENTDECK_DATABASE__PATH=/custom/path/agentdeck.db
#   export AGENTDECK_LOGGING__LEVEL=debug

server:
  host: "0.0.0.0"
  port: 8000
  enable_cors: true

database:
  # Path to SQLite database file (project-local)
  path: ".agentdeck/agentdeck.db"
  max_connections: 5

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"
  # Log format: json, pretty
  format: "json"

deployment:
  # Parent directory of per-deployment environments
  root_dir: "./deployments"
  python: "python3"
  base_package: "google-adk"
  # Ports handed to running agents (inclusive)
  port_range_start: 8100
  port_range_end: 8199
  provision_timeout_secs: 300
  install_timeout_secs: 1800

validation:
  # Reject undeclared variables even for tools that require none
  reject_unknown_without_requirements: false
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl SetupPaths {
    /// Paths rooted at `root`.
    pub fn in_dir(root: &Path) -> Self {
        let config_dir = root.join(".agentdeck");
        Self {
            config_file: config_dir.join("config.yaml"),
            database_file: config_dir.join("agentdeck.db"),
            config_dir,
        }
    }

    /// Paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::in_dir(&current_dir))
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}

/// Create the configuration directory and the default config file.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")?;

    if paths.config_file.exists() && !force {
        return Ok(());
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(())
}

/// Open (creating if needed) the configured database and apply migrations.
pub async fn open_database(config: &Config) -> Result<SqlitePool> {
    let pool = initialize_database(&config.database.url(), Some(PoolConfig::from(&config.database)))
        .await
        .with_context(|| format!("Failed to initialize database at {}", config.database.path))?;
    Ok(pool)
}

/// Assemble repositories and services behind the HTTP handlers.
pub fn build_app_state(
    pool: SqlitePool,
    config: &Config,
    runtime: Arc<dyn AgentRuntime>,
) -> Result<AppState, SynthesisError> {
    let tools = Arc::new(SqliteToolRepository::new(pool.clone()));
    let agents = Arc::new(SqliteAgentRepository::new(pool.clone()));
    let associations = Arc::new(SqliteAssociationRepository::new(pool.clone()));
    let deployments = Arc::new(SqliteDeploymentRepository::new(pool.clone()));
    let remote_targets = Arc::new(SqliteRemoteTargetRepository::new(pool));

    let deployment = &config.deployment;
    let ports = Arc::new(PortPool::new(deployment.port_range_start, deployment.port_range_end));
    let orchestrator = Arc::new(DeploymentOrchestrator::new(
        agents.clone(),
        associations.clone(),
        deployments.clone(),
        runtime,
        Arc::new(ScriptSynthesizer::new(deployment.bootstrap_env.clone())?),
        ports.clone(),
        deployment,
    ));

    Ok(AppState {
        tools: ToolService::new(tools.clone()),
        agents: AgentService::new(
            agents.clone(),
            tools,
            associations,
            EnvValidator::new(&config.validation),
            ports,
        ),
        deployments: DeploymentService::new(agents, deployments, orchestrator, deployment.root_dir.clone()),
        remote_targets: RemoteTargetService::new(remote_targets),
        live_logs: Arc::new(LiveLogRegistry::new()),
    })
}
