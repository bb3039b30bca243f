//! Agent/tool association repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NewToolAssociation, ResolvedAssociation, ToolAssociation};

/// Repository interface for agent/tool associations.
#[async_trait]
pub trait AssociationRepository: Send + Sync {
    /// Insert an association. A duplicate (agent, tool) pair fails with `Conflict`.
    async fn create(&self, association: &NewToolAssociation) -> DomainResult<ToolAssociation>;

    /// Find the association binding `tool_id` to `agent_id`, if any.
    async fn find(&self, agent_id: Uuid, tool_id: i64) -> DomainResult<Option<ToolAssociation>>;

    /// Associations of an agent joined with their tools, in insertion order.
    async fn list_for_agent(&self, agent_id: Uuid) -> DomainResult<Vec<ResolvedAssociation>>;

    /// Delete an association owned by `agent_id`.
    async fn delete(&self, agent_id: Uuid, association_id: i64) -> DomainResult<()>;
}
