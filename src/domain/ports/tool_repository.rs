//! Tool repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{McpTool, NewMcpTool};

/// Repository interface for MCP tool persistence.
#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// Register a tool. Fails with `Conflict` when the name is taken.
    async fn create(&self, tool: &NewMcpTool) -> DomainResult<McpTool>;

    /// Get a tool by ID.
    async fn get(&self, id: i64) -> DomainResult<Option<McpTool>>;

    /// List all tools in registration order.
    async fn list(&self) -> DomainResult<Vec<McpTool>>;

    /// Delete a tool together with every association that references it.
    async fn delete(&self, id: i64) -> DomainResult<()>;
}
