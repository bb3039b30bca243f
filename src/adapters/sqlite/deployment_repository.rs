//! SQLite implementation of the DeploymentRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Deployment, DeploymentStatus, DeploymentType};
use crate::domain::ports::{DeploymentFilter, DeploymentRepository};

#[derive(Clone)]
pub struct SqliteDeploymentRepository {
    pool: SqlitePool,
}

impl SqliteDeploymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeploymentRepository for SqliteDeploymentRepository {
    async fn create(&self, deployment: &Deployment) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO deployments (id, agent_id, deployment_type, status, deployment_path,
               port, error_message, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(deployment.id.to_string())
        .bind(deployment.agent_id.to_string())
        .bind(deployment.deployment_type.as_str())
        .bind(deployment.status.as_str())
        .bind(deployment.deployment_path.to_string_lossy().into_owned())
        .bind(deployment.port.map(i64::from))
        .bind(&deployment.error_message)
        .bind(deployment.created_at.to_rfc3339())
        .bind(deployment.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Deployment>> {
        let row: Option<DeploymentRow> = sqlx::query_as("SELECT * FROM deployments WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: DeploymentFilter) -> DomainResult<Vec<Deployment>> {
        let mut sql = String::from("SELECT * FROM deployments WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(agent_id) = &filter.agent_id {
            sql.push_str(" AND agent_id = ?");
            bindings.push(agent_id.to_string());
        }
        if let Some(status) = &filter.status {
            sql.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, DeploymentRow>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<DeploymentRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DeploymentStatus,
        port: Option<u16>,
        error_message: Option<String>,
    ) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE deployments SET status = ?, port = ?, error_message = ?, updated_at = ? WHERE id = ?"
        )
        .bind(status.as_str())
        .bind(port.map(i64::from))
        .bind(error_message)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::DeploymentNotFound(id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DeploymentRow {
    id: String,
    agent_id: String,
    deployment_type: String,
    status: String,
    deployment_path: String,
    port: Option<i64>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DeploymentRow> for Deployment {
    type Error = DomainError;

    fn try_from(row: DeploymentRow) -> Result<Self, Self::Error> {
        let deployment_type = row
            .deployment_type
            .parse::<DeploymentType>()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let status = row
            .status
            .parse::<DeploymentStatus>()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        Ok(Deployment {
            id: super::parse_uuid(&row.id)?,
            agent_id: super::parse_uuid(&row.agent_id)?,
            deployment_type,
            status,
            deployment_path: PathBuf::from(row.deployment_path),
            port: super::parse_port(row.port)?,
            error_message: row.error_message,
            created_at: super::parse_datetime(&row.created_at)?,
            updated_at: super::parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteAgentRepository};
    use crate::domain::models::{Agent, AgentUpdate};
    use crate::domain::ports::AgentRepository;
    use std::path::Path;

    async fn setup() -> (SqliteDeploymentRepository, SqliteAgentRepository, Agent) {
        let pool = create_migrated_test_pool().await.unwrap();
        let agents = SqliteAgentRepository::new(pool.clone());
        let agent = Agent::new(AgentUpdate::new("bot", "", "m"));
        agents.create(&agent).await.unwrap();
        (SqliteDeploymentRepository::new(pool), agents, agent)
    }

    #[tokio::test]
    async fn test_create_and_transition() {
        let (repo, _, agent) = setup().await;

        let deployment = Deployment::new(agent.id, DeploymentType::Local, Path::new("./deployments"));
        repo.create(&deployment).await.unwrap();

        let stored = repo.get(deployment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeploymentStatus::Deploying);
        assert_eq!(stored.deployment_path, deployment.deployment_path);

        repo.update_status(deployment.id, DeploymentStatus::Running, Some(8100), None).await.unwrap();
        let stored = repo.get(deployment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DeploymentStatus::Running);
        assert_eq!(stored.port, Some(8100));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (repo, _, agent) = setup().await;

        let first = Deployment::new(agent.id, DeploymentType::Local, Path::new("d"));
        let second = Deployment::new(agent.id, DeploymentType::Local, Path::new("d"));
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();
        repo.update_status(second.id, DeploymentStatus::Error, None, Some("boom".to_string())).await.unwrap();

        let all = repo.list(DeploymentFilter { agent_id: Some(agent.id), ..Default::default() }).await.unwrap();
        assert_eq!(all.len(), 2);

        let failed = repo.list(DeploymentFilter { status: Some(DeploymentStatus::Error), ..Default::default() }).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error_message.as_deref(), Some("boom"));

        let none = repo.list(DeploymentFilter { agent_id: Some(Uuid::new_v4()), ..Default::default() }).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_agent_delete_cascades_to_deployments() {
        let (repo, agents, agent) = setup().await;

        let deployment = Deployment::new(agent.id, DeploymentType::Local, Path::new("d"));
        repo.create(&deployment).await.unwrap();

        agents.delete(agent.id).await.unwrap();
        assert!(repo.get(deployment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_deployment() {
        let (repo, _, _) = setup().await;
        let err = repo.update_status(Uuid::new_v4(), DeploymentStatus::Error, None, None).await.unwrap_err();
        assert!(matches!(err, DomainError::DeploymentNotFound(_)));
    }
}
