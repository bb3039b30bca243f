//! SQLite implementation of the AssociationRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{McpTool, NewToolAssociation, ResolvedAssociation, ToolAssociation};
use crate::domain::ports::AssociationRepository;

#[derive(Clone)]
pub struct SqliteAssociationRepository {
    pool: SqlitePool,
}

impl SqliteAssociationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssociationRepository for SqliteAssociationRepository {
    async fn create(&self, association: &NewToolAssociation) -> DomainResult<ToolAssociation> {
        let env_json = serde_json::to_string(&association.env_values)?;
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO agent_tool_associations (agent_id, tool_id, env_values, created_at)
               VALUES (?, ?, ?, ?)"#
        )
        .bind(association.agent_id.to_string())
        .bind(association.tool_id)
        .bind(&env_json)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            super::map_unique_violation(e, || {
                "This MCP tool is already associated with this agent".to_string()
            })
        })?;

        Ok(ToolAssociation {
            id: result.last_insert_rowid(),
            agent_id: association.agent_id,
            tool_id: association.tool_id,
            env_values: association.env_values.clone(),
            created_at,
        })
    }

    async fn find(&self, agent_id: Uuid, tool_id: i64) -> DomainResult<Option<ToolAssociation>> {
        let row: Option<AssociationRow> = sqlx::query_as(
            "SELECT * FROM agent_tool_associations WHERE agent_id = ? AND tool_id = ?"
        )
        .bind(agent_id.to_string())
        .bind(tool_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_for_agent(&self, agent_id: Uuid) -> DomainResult<Vec<ResolvedAssociation>> {
        let rows: Vec<ResolvedRow> = sqlx::query_as(
            r#"SELECT a.id, a.agent_id, a.tool_id, a.env_values, a.created_at,
                      t.name AS tool_name, t.package AS tool_package,
                      t.description AS tool_description, t.required_env AS tool_required_env,
                      t.created_at AS tool_created_at
               FROM agent_tool_associations a
               JOIN mcp_tools t ON t.id = a.tool_id
               WHERE a.agent_id = ?
               ORDER BY a.id"#
        )
        .bind(agent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, agent_id: Uuid, association_id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM agent_tool_associations WHERE id = ? AND agent_id = ?")
            .bind(association_id)
            .bind(agent_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AssociationNotFound { agent_id, association_id });
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct AssociationRow {
    id: i64,
    agent_id: String,
    tool_id: i64,
    env_values: Option<String>,
    created_at: String,
}

impl TryFrom<AssociationRow> for ToolAssociation {
    type Error = DomainError;

    fn try_from(row: AssociationRow) -> Result<Self, Self::Error> {
        let env_values: BTreeMap<String, String> = super::parse_json_or_default(row.env_values)?;
        Ok(ToolAssociation {
            id: row.id,
            agent_id: super::parse_uuid(&row.agent_id)?,
            tool_id: row.tool_id,
            env_values,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResolvedRow {
    #[sqlx(flatten)]
    association: AssociationRow,
    tool_name: String,
    tool_package: String,
    tool_description: String,
    tool_required_env: Option<String>,
    tool_created_at: String,
}

impl TryFrom<ResolvedRow> for ResolvedAssociation {
    type Error = DomainError;

    fn try_from(row: ResolvedRow) -> Result<Self, Self::Error> {
        let association = ToolAssociation::try_from(row.association)?;
        let tool = McpTool {
            id: association.tool_id,
            name: row.tool_name,
            package: row.tool_package,
            description: row.tool_description,
            required_env: super::parse_json_or_default(row.tool_required_env)?,
            created_at: super::parse_datetime(&row.tool_created_at)?,
        };
        Ok(ResolvedAssociation::new(association, tool))
    }
}
