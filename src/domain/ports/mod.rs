//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces implemented by the adapters:
//! - Catalog repositories (tools, agents, associations, deployments, remote targets)
//! - AgentRuntime: isolated environment provisioning and process launch

pub mod agent_repository;
pub mod agent_runtime;
pub mod association_repository;
pub mod deployment_repository;
pub mod remote_target_repository;
pub mod tool_repository;

pub use agent_repository::AgentRepository;
pub use agent_runtime::{AgentRuntime, CommandOutcome};
pub use association_repository::AssociationRepository;
pub use deployment_repository::{DeploymentFilter, DeploymentRepository};
pub use remote_target_repository::RemoteTargetRepository;
pub use tool_repository::ToolRepository;
