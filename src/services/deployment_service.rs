//! Deployment requests and lookups.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Deployment, DeploymentType};
use crate::domain::ports::{AgentRepository, DeploymentFilter, DeploymentRepository};
use crate::services::deployment_orchestrator::DeploymentOrchestrator;

/// A deployment that has been recorded and handed to the orchestrator.
#[derive(Debug)]
pub struct StartedDeployment {
    pub deployment: Deployment,
    /// Pipeline task; aborting it cancels the deployment in flight.
    pub task: JoinHandle<()>,
}

pub struct DeploymentService {
    agents: Arc<dyn AgentRepository>,
    deployments: Arc<dyn DeploymentRepository>,
    orchestrator: Arc<DeploymentOrchestrator>,
    root_dir: PathBuf,
}

impl DeploymentService {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        deployments: Arc<dyn DeploymentRepository>,
        orchestrator: Arc<DeploymentOrchestrator>,
        root_dir: PathBuf,
    ) -> Self {
        // Recorded paths stay valid whatever directory later reads them.
        let root_dir = std::path::absolute(&root_dir).unwrap_or(root_dir);
        Self {
            agents,
            deployments,
            orchestrator,
            root_dir,
        }
    }

    /// Record a `deploying` deployment for `agent_id` and start its pipeline
    /// without waiting for it.
    pub async fn start(&self, agent_id: Uuid, deployment_type: DeploymentType) -> DomainResult<StartedDeployment> {
        if self.agents.get(agent_id).await?.is_none() {
            return Err(DomainError::AgentNotFound(agent_id));
        }

        let deployment = Deployment::new(agent_id, deployment_type, &self.root_dir);
        self.deployments.create(&deployment).await?;
        info!(deployment_id = %deployment.id, %agent_id, %deployment_type, "Deployment requested");

        let task = self.orchestrator.spawn(deployment.clone());
        Ok(StartedDeployment { deployment, task })
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Deployment> {
        self.deployments
            .get(id)
            .await?
            .ok_or(DomainError::DeploymentNotFound(id))
    }

    pub async fn list(&self, filter: DeploymentFilter) -> DomainResult<Vec<Deployment>> {
        self.deployments.list(filter).await
    }

    /// Keep ports of already running deployments out of circulation.
    pub async fn restore_port_leases(&self) -> DomainResult<usize> {
        self.orchestrator.reserve_running_ports().await
    }
}
