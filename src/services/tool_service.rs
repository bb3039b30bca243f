//! MCP tool registry service.

use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{McpTool, NewMcpTool};
use crate::domain::ports::ToolRepository;

pub struct ToolService {
    repository: Arc<dyn ToolRepository>,
}

impl ToolService {
    pub fn new(repository: Arc<dyn ToolRepository>) -> Self {
        Self { repository }
    }

    /// Register a tool. Names are unique.
    pub async fn register(&self, tool: NewMcpTool) -> DomainResult<McpTool> {
        tool.validate().map_err(DomainError::ValidationFailed)?;
        let tool = self.repository.create(&tool).await?;
        info!(tool_id = tool.id, name = %tool.name, "Registered MCP tool");
        Ok(tool)
    }

    pub async fn get(&self, id: i64) -> DomainResult<McpTool> {
        self.repository.get(id).await?.ok_or(DomainError::ToolNotFound(id))
    }

    pub async fn list(&self) -> DomainResult<Vec<McpTool>> {
        self.repository.list().await
    }

    /// Delete a tool and every association that references it.
    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        self.repository.delete(id).await?;
        info!(tool_id = id, "Deleted MCP tool");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteToolRepository};

    async fn service() -> ToolService {
        let pool = create_migrated_test_pool().await.unwrap();
        ToolService::new(Arc::new(SqliteToolRepository::new(pool)))
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let service = service().await;
        let tool = service
            .register(NewMcpTool::new("search", "search-mcp").with_required_env(["API_KEY"]))
            .await
            .unwrap();

        let fetched = service.get(tool.id).await.unwrap();
        assert_eq!(fetched.required_env, vec!["API_KEY"]);
    }

    #[tokio::test]
    async fn test_register_rejects_blank_package() {
        let service = service().await;
        let err = service.register(NewMcpTool::new("search", "")).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let service = service().await;
        service.register(NewMcpTool::new("search", "a")).await.unwrap();
        let err = service.register(NewMcpTool::new("search", "b")).await.unwrap_err();
        assert_eq!(err.to_string(), "MCP tool 'search' already exists");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let service = service().await;
        assert!(matches!(service.get(7).await, Err(DomainError::ToolNotFound(7))));
    }
}
