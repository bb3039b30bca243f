//! Application services coordinating the catalog store, validation, script
//! synthesis and the deployment pipeline.

pub mod agent_service;
pub mod deployment_orchestrator;
pub mod deployment_service;
pub mod env_validator;
pub mod live_log;
pub mod port_pool;
pub mod remote_target_service;
pub mod script_synthesizer;
pub mod tool_service;

pub use agent_service::{AgentDetails, AgentService};
pub use deployment_orchestrator::{DeploymentOrchestrator, PipelineFailure};
pub use deployment_service::{DeploymentService, StartedDeployment};
pub use env_validator::EnvValidator;
pub use live_log::{LiveLogRegistry, LogEvent, LogSubscription};
pub use port_pool::{PortLease, PortPool};
pub use remote_target_service::RemoteTargetService;
pub use script_synthesizer::{ScriptSynthesizer, SynthesisError};
pub use tool_service::ToolService;
