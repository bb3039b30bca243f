//! agentdeck - management backend for LLM agents
//!
//! agentdeck keeps a registry of MCP tools and agents, binds tools to agents
//! with validated environment variables, and deploys agents locally by
//! synthesizing a runnable script into an isolated Python environment.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and repository/runtime ports
//! - **Service Layer** (`services`): validation, script synthesis, deployment pipeline
//! - **Adapters** (`adapters`): `SQLite` repositories, process runtime, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, wiring
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Agent, AgentUpdate, Config, Deployment, DeploymentStatus, DeploymentType, McpTool, RemoteTarget, ToolAssociation,
};
pub use domain::ports::{
    AgentRepository, AgentRuntime, AssociationRepository, DeploymentRepository, RemoteTargetRepository,
    ToolRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AgentService, DeploymentService, EnvValidator, ScriptSynthesizer, ToolService};
