//! SQLite implementation of the ToolRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{McpTool, NewMcpTool};
use crate::domain::ports::ToolRepository;

#[derive(Clone)]
pub struct SqliteToolRepository {
    pool: SqlitePool,
}

impl SqliteToolRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ToolRepository for SqliteToolRepository {
    async fn create(&self, tool: &NewMcpTool) -> DomainResult<McpTool> {
        let required_json = serde_json::to_string(&tool.required_env)?;
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO mcp_tools (name, package, description, required_env, created_at)
               VALUES (?, ?, ?, ?, ?)"#
        )
        .bind(&tool.name)
        .bind(&tool.package)
        .bind(&tool.description)
        .bind(&required_json)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| super::map_unique_violation(e, || format!("MCP tool '{}' already exists", tool.name)))?;

        Ok(McpTool {
            id: result.last_insert_rowid(),
            name: tool.name.clone(),
            package: tool.package.clone(),
            description: tool.description.clone(),
            required_env: tool.required_env.clone(),
            created_at,
        })
    }

    async fn get(&self, id: i64) -> DomainResult<Option<McpTool>> {
        let row: Option<ToolRow> = sqlx::query_as("SELECT * FROM mcp_tools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<McpTool>> {
        let rows: Vec<ToolRow> = sqlx::query_as("SELECT * FROM mcp_tools ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM agent_tool_associations WHERE tool_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM mcp_tools WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ToolNotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ToolRow {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) package: String,
    pub(super) description: String,
    pub(super) required_env: Option<String>,
    pub(super) created_at: String,
}

impl TryFrom<ToolRow> for McpTool {
    type Error = DomainError;

    fn try_from(row: ToolRow) -> Result<Self, Self::Error> {
        Ok(McpTool {
            id: row.id,
            name: row.name,
            package: row.package,
            description: row.description,
            required_env: super::parse_json_or_default(row.required_env)?,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteToolRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteToolRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_tool() {
        let repo = setup_test_repo().await;

        let tool = NewMcpTool::new("search", "pkg-search")
            .with_description("Web search")
            .with_required_env(["API_KEY", "REGION"]);
        let created = repo.create(&tool).await.unwrap();

        let retrieved = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "search");
        assert_eq!(retrieved.package, "pkg-search");
        assert_eq!(retrieved.required_env, vec!["API_KEY", "REGION"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = setup_test_repo().await;

        repo.create(&NewMcpTool::new("search", "pkg-a")).await.unwrap();
        let err = repo.create(&NewMcpTool::new("search", "pkg-b")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_in_registration_order() {
        let repo = setup_test_repo().await;

        repo.create(&NewMcpTool::new("b-tool", "pkg-b")).await.unwrap();
        repo.create(&NewMcpTool::new("a-tool", "pkg-a")).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["b-tool", "a-tool"]);
    }

    #[tokio::test]
    async fn test_delete_missing_tool() {
        let repo = setup_test_repo().await;
        let err = repo.delete(42).await.unwrap_err();
        assert!(matches!(err, DomainError::ToolNotFound(42)));
    }
}
