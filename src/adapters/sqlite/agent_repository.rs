//! SQLite implementation of the AgentRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, AgentType};
use crate::domain::ports::AgentRepository;

#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: &Agent) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO agents (id, name, instruction, model, agent_type, usecase_id, api_key,
               consumer_key, consumer_secret, position_x, position_y, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.instruction)
        .bind(&agent.model)
        .bind(agent.agent_type.as_str())
        .bind(&agent.usecase_id)
        .bind(&agent.api_key)
        .bind(&agent.consumer_key)
        .bind(&agent.consumer_secret)
        .bind(agent.position_x)
        .bind(agent.position_y)
        .bind(agent.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| super::map_unique_violation(e, || format!("Agent {} already exists", agent.id)))?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Agent>> {
        let rows: Vec<AgentRow> = sqlx::query_as("SELECT * FROM agents ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, agent: &Agent) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE agents SET name = ?, instruction = ?, model = ?, agent_type = ?,
               usecase_id = ?, api_key = ?, consumer_key = ?, consumer_secret = ?,
               position_x = ?, position_y = ?
               WHERE id = ?"#
        )
        .bind(&agent.name)
        .bind(&agent.instruction)
        .bind(&agent.model)
        .bind(agent.agent_type.as_str())
        .bind(&agent.usecase_id)
        .bind(&agent.api_key)
        .bind(&agent.consumer_key)
        .bind(&agent.consumer_secret)
        .bind(agent.position_x)
        .bind(agent.position_y)
        .bind(agent.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AgentNotFound(agent.id));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<Vec<u16>> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await?;

        // Owned children first; the foreign keys refuse the agent row otherwise.
        let associations = sqlx::query("DELETE FROM agent_tool_associations WHERE agent_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;
        let ports: Vec<i64> =
            sqlx::query_scalar("SELECT port FROM deployments WHERE agent_id = ? AND port IS NOT NULL")
                .bind(&id_str)
                .fetch_all(&mut *tx)
                .await?;
        let deployments = sqlx::query("DELETE FROM deployments WHERE agent_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AgentNotFound(id));
        }

        tx.commit().await?;

        tracing::debug!(
            agent_id = %id,
            associations = associations.rows_affected(),
            deployments = deployments.rows_affected(),
            "deleted agent and owned records"
        );
        Ok(ports.into_iter().filter_map(|port| u16::try_from(port).ok()).collect())
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    name: String,
    instruction: String,
    model: String,
    agent_type: String,
    usecase_id: Option<String>,
    api_key: Option<String>,
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    position_x: i64,
    position_y: i64,
    created_at: String,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        let agent_type = row
            .agent_type
            .parse::<AgentType>()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        Ok(Agent {
            id: super::parse_uuid(&row.id)?,
            name: row.name,
            instruction: row.instruction,
            model: row.model,
            agent_type,
            usecase_id: row.usecase_id,
            api_key: row.api_key,
            consumer_key: row.consumer_key,
            consumer_secret: row.consumer_secret,
            position_x: row.position_x,
            position_y: row.position_y,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::AgentUpdate;

    async fn setup_test_repo() -> SqliteAgentRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteAgentRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_agent() {
        let repo = setup_test_repo().await;

        let agent = Agent::new(
            AgentUpdate::new("bot", "You answer questions.", "gemini-2.0-flash").with_credentials(
                Some("uc-1".to_string()),
                Some("secret".to_string()),
                None,
                None,
            ),
        );
        repo.create(&agent).await.unwrap();

        let retrieved = repo.get(agent.id).await.unwrap().unwrap();
        assert_eq!(retrieved, Agent { created_at: retrieved.created_at, ..agent });
    }

    #[tokio::test]
    async fn test_update_agent() {
        let repo = setup_test_repo().await;

        let mut agent = Agent::new(AgentUpdate::new("bot", "old", "model-a"));
        repo.create(&agent).await.unwrap();

        agent.apply_update(AgentUpdate::new("bot-2", "new", "model-b"));
        repo.update(&agent).await.unwrap();

        let retrieved = repo.get(agent.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "bot-2");
        assert_eq!(retrieved.instruction, "new");
        assert_eq!(retrieved.model, "model-b");
    }

    #[tokio::test]
    async fn test_update_missing_agent() {
        let repo = setup_test_repo().await;
        let agent = Agent::new(AgentUpdate::new("ghost", "", "m"));
        let err = repo.update(&agent).await.unwrap_err();
        assert!(matches!(err, DomainError::AgentNotFound(id) if id == agent.id));
    }

    #[tokio::test]
    async fn test_delete_agent() {
        let repo = setup_test_repo().await;

        let agent = Agent::new(AgentUpdate::new("bot", "", "m"));
        repo.create(&agent).await.unwrap();
        assert!(repo.delete(agent.id).await.unwrap().is_empty());

        assert!(repo.get(agent.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(agent.id).await, Err(DomainError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_agent_returns_deployment_ports() {
        use crate::adapters::sqlite::SqliteDeploymentRepository;
        use crate::domain::models::{Deployment, DeploymentStatus, DeploymentType};
        use crate::domain::ports::DeploymentRepository;

        let pool = create_migrated_test_pool().await.unwrap();
        let repo = SqliteAgentRepository::new(pool.clone());
        let deployments = SqliteDeploymentRepository::new(pool);

        let agent = Agent::new(AgentUpdate::new("bot", "", "m"));
        repo.create(&agent).await.unwrap();

        let running = Deployment::new(agent.id, DeploymentType::Local, std::path::Path::new("/srv"));
        deployments.create(&running).await.unwrap();
        deployments
            .update_status(running.id, DeploymentStatus::Running, Some(8105), None)
            .await
            .unwrap();
        let failed = Deployment::new(agent.id, DeploymentType::Local, std::path::Path::new("/srv"));
        deployments.create(&failed).await.unwrap();

        assert_eq!(repo.delete(agent.id).await.unwrap(), vec![8105]);
        assert!(deployments.get(running.id).await.unwrap().is_none());
    }
}
