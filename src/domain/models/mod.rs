//! Domain models for agentdeck.

pub mod agent;
pub mod association;
pub mod config;
pub mod deployment;
pub mod remote_target;
pub mod tool;

pub use agent::{Agent, AgentType, AgentUpdate, DEFAULT_POSITION_X, DEFAULT_POSITION_Y};
pub use association::{NewToolAssociation, ResolvedAssociation, ToolAssociation};
pub use config::{
    Config, DatabaseConfig, DeploymentConfig, LoggingConfig, ServerConfig, ValidationConfig,
};
pub use deployment::{Deployment, DeploymentStatus, DeploymentType};
pub use remote_target::{NewRemoteTarget, RemoteTarget};
pub use tool::{McpTool, NewMcpTool};
