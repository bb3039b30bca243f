//! Deployment repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Deployment, DeploymentStatus};

/// Filter criteria for listing deployments.
#[derive(Debug, Clone, Default)]
pub struct DeploymentFilter {
    pub agent_id: Option<Uuid>,
    pub status: Option<DeploymentStatus>,
}

/// Repository interface for Deployment persistence.
#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    /// Create a deployment record.
    async fn create(&self, deployment: &Deployment) -> DomainResult<()>;

    /// Get a deployment by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Deployment>>;

    /// List deployments, newest first.
    async fn list(&self, filter: DeploymentFilter) -> DomainResult<Vec<Deployment>>;

    /// Write status, port and failure reason of a deployment.
    async fn update_status(
        &self,
        id: Uuid,
        status: DeploymentStatus,
        port: Option<u16>,
        error_message: Option<String>,
    ) -> DomainResult<()>;
}
