//! Agent service: agent CRUD and tool association management.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, AgentUpdate, NewToolAssociation, ResolvedAssociation, ToolAssociation};
use crate::domain::ports::{AgentRepository, AssociationRepository, ToolRepository};
use crate::services::env_validator::EnvValidator;
use crate::services::port_pool::PortPool;

/// An agent together with its associated tools, in association order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDetails {
    pub agent: Agent,
    pub tools: Vec<ResolvedAssociation>,
}

pub struct AgentService {
    agents: Arc<dyn AgentRepository>,
    tools: Arc<dyn ToolRepository>,
    associations: Arc<dyn AssociationRepository>,
    validator: EnvValidator,
    ports: Arc<PortPool>,
}

impl AgentService {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        tools: Arc<dyn ToolRepository>,
        associations: Arc<dyn AssociationRepository>,
        validator: EnvValidator,
        ports: Arc<PortPool>,
    ) -> Self {
        Self {
            agents,
            tools,
            associations,
            validator,
            ports,
        }
    }

    pub async fn create(&self, fields: AgentUpdate) -> DomainResult<AgentDetails> {
        fields.validate().map_err(DomainError::ValidationFailed)?;

        let agent = Agent::new(fields);
        self.agents.create(&agent).await?;
        info!(agent_id = %agent.id, name = %agent.name, "Created agent");

        Ok(AgentDetails {
            agent,
            tools: Vec::new(),
        })
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<AgentDetails> {
        let agent = self.require_agent(id).await?;
        let tools = self.associations.list_for_agent(id).await?;
        Ok(AgentDetails { agent, tools })
    }

    pub async fn list(&self) -> DomainResult<Vec<AgentDetails>> {
        let agents = self.agents.list().await?;
        let mut details = Vec::with_capacity(agents.len());
        for agent in agents {
            let tools = self.associations.list_for_agent(agent.id).await?;
            details.push(AgentDetails { agent, tools });
        }
        Ok(details)
    }

    /// Replace every mutable field of an agent. Associations are untouched.
    pub async fn update(&self, id: Uuid, fields: AgentUpdate) -> DomainResult<AgentDetails> {
        fields.validate().map_err(DomainError::ValidationFailed)?;

        let mut agent = self.require_agent(id).await?;
        agent.apply_update(fields);
        self.agents.update(&agent).await?;
        info!(agent_id = %id, "Updated agent");

        let tools = self.associations.list_for_agent(id).await?;
        Ok(AgentDetails { agent, tools })
    }

    /// Delete an agent with its associations and deployment records, and
    /// return the ports of those deployments to the pool.
    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let freed = self.agents.delete(id).await?;
        for port in &freed {
            self.ports.release(*port);
        }
        info!(agent_id = %id, freed_ports = freed.len(), "Deleted agent");
        Ok(())
    }

    /// Bind a tool to an agent after checking `env_values` against the
    /// tool's required variables.
    pub async fn attach_tool(
        &self,
        agent_id: Uuid,
        tool_id: i64,
        env_values: BTreeMap<String, String>,
    ) -> DomainResult<ToolAssociation> {
        self.require_agent(agent_id).await?;
        let tool = self
            .tools
            .get(tool_id)
            .await?
            .ok_or(DomainError::ToolNotFound(tool_id))?;

        if self.associations.find(agent_id, tool_id).await?.is_some() {
            return Err(already_associated(&tool.name));
        }

        self.validator.validate(&tool.required_env, &env_values)?;

        let association = self
            .associations
            .create(&NewToolAssociation {
                agent_id,
                tool_id,
                env_values,
            })
            .await
            .map_err(|e| match e {
                DomainError::Conflict(_) => already_associated(&tool.name),
                other => other,
            })?;

        info!(%agent_id, tool_id, association_id = association.id, "Attached tool to agent");
        Ok(association)
    }

    pub async fn detach_tool(&self, agent_id: Uuid, association_id: i64) -> DomainResult<()> {
        self.associations.delete(agent_id, association_id).await?;
        info!(%agent_id, association_id, "Detached tool from agent");
        Ok(())
    }

    async fn require_agent(&self, id: Uuid) -> DomainResult<Agent> {
        self.agents.get(id).await?.ok_or(DomainError::AgentNotFound(id))
    }
}

fn already_associated(tool_name: &str) -> DomainError {
    DomainError::Conflict(format!("MCP tool {tool_name} is already associated with this agent"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteAgentRepository, SqliteAssociationRepository, SqliteToolRepository,
    };
    use crate::domain::errors::EnvValidationError;
    use crate::domain::models::NewMcpTool;

    async fn setup() -> (AgentService, Arc<SqliteToolRepository>) {
        let pool = create_migrated_test_pool().await.unwrap();
        let tools = Arc::new(SqliteToolRepository::new(pool.clone()));
        let service = AgentService::new(
            Arc::new(SqliteAgentRepository::new(pool.clone())),
            tools.clone(),
            Arc::new(SqliteAssociationRepository::new(pool)),
            EnvValidator::default(),
            Arc::new(PortPool::new(8100, 8101)),
        );
        (service, tools)
    }

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (service, _) = setup().await;
        let err = service.create(AgentUpdate::new(" ", "i", "m")).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_attach_and_list_in_order() {
        let (service, tools) = setup().await;
        let agent = service.create(AgentUpdate::new("bot", "i", "m")).await.unwrap().agent;
        let a = tools.create(&NewMcpTool::new("a", "pkg-a")).await.unwrap();
        let b = tools
            .create(&NewMcpTool::new("b", "pkg-b").with_required_env(["TOKEN"]))
            .await
            .unwrap();

        service.attach_tool(agent.id, b.id, env(&[("TOKEN", "t")])).await.unwrap();
        service.attach_tool(agent.id, a.id, BTreeMap::new()).await.unwrap();

        let details = service.get(agent.id).await.unwrap();
        let names: Vec<_> = details.tools.iter().map(|r| r.tool.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_attach_twice_conflicts() {
        let (service, tools) = setup().await;
        let agent = service.create(AgentUpdate::new("bot", "i", "m")).await.unwrap().agent;
        let tool = tools.create(&NewMcpTool::new("search", "pkg")).await.unwrap();

        service.attach_tool(agent.id, tool.id, BTreeMap::new()).await.unwrap();
        let err = service.attach_tool(agent.id, tool.id, BTreeMap::new()).await.unwrap_err();

        assert_eq!(err.to_string(), "MCP tool search is already associated with this agent");
    }

    #[tokio::test]
    async fn test_attach_validates_env() {
        let (service, tools) = setup().await;
        let agent = service.create(AgentUpdate::new("bot", "i", "m")).await.unwrap().agent;
        let tool = tools
            .create(&NewMcpTool::new("search", "pkg").with_required_env(["API_KEY"]))
            .await
            .unwrap();

        let err = service.attach_tool(agent.id, tool.id, BTreeMap::new()).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidEnvironment(EnvValidationError::Missing(ref names)) if names == &["API_KEY"]
        ));
        assert!(service.get(agent.id).await.unwrap().tools.is_empty());
    }

    #[tokio::test]
    async fn test_attach_to_missing_agent_or_tool() {
        let (service, tools) = setup().await;
        let tool = tools.create(&NewMcpTool::new("search", "pkg")).await.unwrap();
        let err = service.attach_tool(Uuid::new_v4(), tool.id, BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::AgentNotFound(_)));

        let agent = service.create(AgentUpdate::new("bot", "i", "m")).await.unwrap().agent;
        let err = service.attach_tool(agent.id, 999, BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::ToolNotFound(999)));
    }

    #[tokio::test]
    async fn test_update_keeps_associations() {
        let (service, tools) = setup().await;
        let agent = service.create(AgentUpdate::new("bot", "i", "m")).await.unwrap().agent;
        let tool = tools.create(&NewMcpTool::new("search", "pkg")).await.unwrap();
        service.attach_tool(agent.id, tool.id, BTreeMap::new()).await.unwrap();

        let updated = service
            .update(agent.id, AgentUpdate::new("renamed", "new", "m2"))
            .await
            .unwrap();

        assert_eq!(updated.agent.name, "renamed");
        assert_eq!(updated.agent.created_at, agent.created_at);
        assert_eq!(updated.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_detach_is_scoped_to_agent() {
        let (service, tools) = setup().await;
        let owner = service.create(AgentUpdate::new("a", "i", "m")).await.unwrap().agent;
        let other = service.create(AgentUpdate::new("b", "i", "m")).await.unwrap().agent;
        let tool = tools.create(&NewMcpTool::new("search", "pkg")).await.unwrap();
        let association = service.attach_tool(owner.id, tool.id, BTreeMap::new()).await.unwrap();

        let err = service.detach_tool(other.id, association.id).await.unwrap_err();
        assert!(matches!(err, DomainError::AssociationNotFound { .. }));

        service.detach_tool(owner.id, association.id).await.unwrap();
        assert!(service.get(owner.id).await.unwrap().tools.is_empty());
    }
}
