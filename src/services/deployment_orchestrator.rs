//! Local deployment pipeline.
//!
//! A deployment starts in `deploying` and the orchestrator moves it to
//! exactly one of `running` or `error`:
//!
//! 1. create the isolated environment
//! 2. install the base package plus every associated tool package in one batch
//! 3. write the agent script into the deployment directory
//! 4. lease a port and launch the script detached
//!
//! Any step failing records `error` with the reason and stops the pipeline.
//! Work runs on a spawned task; aborting its `JoinHandle` cancels the
//! in-flight step and kills its subprocess.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Deployment, DeploymentConfig, DeploymentStatus, DeploymentType};
use crate::domain::ports::{
    AgentRepository, AgentRuntime, AssociationRepository, DeploymentFilter, DeploymentRepository,
};
use crate::services::port_pool::PortPool;
use crate::services::script_synthesizer::ScriptSynthesizer;

/// Why a deployment pipeline stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineFailure {
    RemoteUnsupported,
    AgentMissing(Uuid),
    Provision(String),
    Install(String),
    Script(String),
    NoFreePort,
    Launch(String),
    Store(String),
    Superseded(DeploymentStatus),
    Vanished,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteUnsupported => f.write_str("remote deployments are not supported"),
            Self::AgentMissing(id) => write!(f, "agent {id} no longer exists"),
            Self::Provision(reason) => write!(f, "environment creation failed: {reason}"),
            Self::Install(reason) => write!(f, "package installation failed: {reason}"),
            Self::Script(reason) => write!(f, "script generation failed: {reason}"),
            Self::NoFreePort => f.write_str("no free port available"),
            Self::Launch(reason) => write!(f, "agent launch failed: {reason}"),
            Self::Store(reason) => write!(f, "catalog store error: {reason}"),
            Self::Superseded(status) => write!(f, "deployment is already {status}"),
            Self::Vanished => f.write_str("deployment record no longer exists"),
        }
    }
}

impl From<DomainError> for PipelineFailure {
    fn from(err: DomainError) -> Self {
        Self::Store(err.to_string())
    }
}

pub struct DeploymentOrchestrator {
    agents: Arc<dyn AgentRepository>,
    associations: Arc<dyn AssociationRepository>,
    deployments: Arc<dyn DeploymentRepository>,
    runtime: Arc<dyn AgentRuntime>,
    synthesizer: Arc<ScriptSynthesizer>,
    ports: Arc<PortPool>,
    base_package: String,
    script_name: String,
}

impl DeploymentOrchestrator {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        associations: Arc<dyn AssociationRepository>,
        deployments: Arc<dyn DeploymentRepository>,
        runtime: Arc<dyn AgentRuntime>,
        synthesizer: Arc<ScriptSynthesizer>,
        ports: Arc<PortPool>,
        config: &DeploymentConfig,
    ) -> Self {
        Self {
            agents,
            associations,
            deployments,
            runtime,
            synthesizer,
            ports,
            base_package: config.base_package.clone(),
            script_name: config.script_name.clone(),
        }
    }

    /// Run the pipeline for `deployment` on a background task.
    pub fn spawn(self: &Arc<Self>, deployment: Deployment) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run(&deployment).await {
                error!(deployment_id = %deployment.id, error = %e, "Failed to record deployment outcome");
            }
        })
    }

    /// Run the pipeline to completion and record the final status.
    #[instrument(skip(self, deployment), fields(deployment_id = %deployment.id, agent_id = %deployment.agent_id))]
    pub async fn run(&self, deployment: &Deployment) -> DomainResult<DeploymentStatus> {
        match self.execute(deployment).await {
            Ok(port) => {
                info!(port, "Deployment running");
                self.finish(deployment.id, DeploymentStatus::Running, Some(port), None)
                    .await?;
                Ok(DeploymentStatus::Running)
            }
            Err(failure) => {
                warn!(reason = %failure, "Deployment failed");
                self.finish(deployment.id, DeploymentStatus::Error, None, Some(failure.to_string()))
                    .await?;
                Ok(DeploymentStatus::Error)
            }
        }
    }

    /// Re-lease the ports of deployments recorded as running, so a restart
    /// never hands them out again.
    pub async fn reserve_running_ports(&self) -> DomainResult<usize> {
        let running = self
            .deployments
            .list(DeploymentFilter {
                agent_id: None,
                status: Some(DeploymentStatus::Running),
            })
            .await?;

        let reserved = running
            .iter()
            .filter_map(|d| d.port)
            .filter(|port| self.ports.reserve(*port))
            .count();
        info!(reserved, "Reserved ports of running deployments");
        Ok(reserved)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<u16, PipelineFailure> {
        if deployment.deployment_type == DeploymentType::Remote {
            return Err(PipelineFailure::RemoteUnsupported);
        }

        let agent = self
            .agents
            .get(deployment.agent_id)
            .await?
            .ok_or(PipelineFailure::AgentMissing(deployment.agent_id))?;
        let associations = self.associations.list_for_agent(agent.id).await?;
        let dir = &deployment.deployment_path;

        info!(dir = %dir.display(), "Provisioning environment");
        let outcome = self
            .runtime
            .provision(dir)
            .await
            .map_err(|e| PipelineFailure::Provision(e.to_string()))?;
        if !outcome.is_success() {
            return Err(PipelineFailure::Provision(outcome.to_string()));
        }

        let packages: Vec<String> = std::iter::once(self.base_package.clone())
            .chain(associations.iter().map(|a| a.tool.package.clone()))
            .collect();
        let outcome = self
            .runtime
            .install(dir, &packages)
            .await
            .map_err(|e| PipelineFailure::Install(e.to_string()))?;
        if !outcome.is_success() {
            return Err(PipelineFailure::Install(outcome.to_string()));
        }

        let script = self
            .synthesizer
            .render(&agent, &associations)
            .map_err(|e| PipelineFailure::Script(e.to_string()))?;
        let script_path = self.script_path(deployment);
        tokio::fs::write(&script_path, script)
            .await
            .map_err(|e| PipelineFailure::Script(e.to_string()))?;

        // No process may start for a record that is gone or already settled.
        let current = self
            .deployments
            .get(deployment.id)
            .await?
            .ok_or(PipelineFailure::Vanished)?;
        if current.status != DeploymentStatus::Deploying {
            return Err(PipelineFailure::Superseded(current.status));
        }

        let lease = self.ports.lease().ok_or(PipelineFailure::NoFreePort)?;
        self.runtime
            .launch(dir, &script_path, lease.port())
            .await
            .map_err(|e| PipelineFailure::Launch(e.to_string()))?;

        Ok(lease.keep())
    }

    fn script_path(&self, deployment: &Deployment) -> PathBuf {
        deployment.deployment_path.join(&self.script_name)
    }

    /// Record the outcome. A port passed in is released unless it ends up
    /// stored on a `running` record.
    async fn finish(
        &self,
        id: Uuid,
        next: DeploymentStatus,
        port: Option<u16>,
        error_message: Option<String>,
    ) -> DomainResult<()> {
        let recorded = self.record_outcome(id, next, port, error_message).await;
        if !matches!(recorded, Ok(true)) {
            if let Some(port) = port {
                self.ports.release(port);
            }
        }
        recorded.map(|_| ())
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        next: DeploymentStatus,
        port: Option<u16>,
        error_message: Option<String>,
    ) -> DomainResult<bool> {
        let current = self
            .deployments
            .get(id)
            .await?
            .ok_or(DomainError::DeploymentNotFound(id))?;

        if !current.status.can_transition_to(next) {
            warn!(from = %current.status, to = %next, "Ignoring invalid deployment transition");
            return Ok(false);
        }

        self.deployments.update_status(id, next, port, error_message).await?;
        Ok(true)
    }
}
