//! Agent repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Agent;

/// Repository interface for Agent persistence.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Create a new agent.
    async fn create(&self, agent: &Agent) -> DomainResult<()>;

    /// Get an agent by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Agent>>;

    /// List agents in creation order.
    async fn list(&self) -> DomainResult<Vec<Agent>>;

    /// Persist every mutable field of an existing agent.
    async fn update(&self, agent: &Agent) -> DomainResult<()>;

    /// Delete an agent and everything it owns (associations, deployments).
    ///
    /// Returns the ports that the removed deployments held.
    async fn delete(&self, id: Uuid) -> DomainResult<Vec<u16>>;
}
