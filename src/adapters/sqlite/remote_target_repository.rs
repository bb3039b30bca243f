//! SQLite implementation of the RemoteTargetRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewRemoteTarget, RemoteTarget};
use crate::domain::ports::RemoteTargetRepository;

#[derive(Clone)]
pub struct SqliteRemoteTargetRepository {
    pool: SqlitePool,
}

impl SqliteRemoteTargetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteTargetRepository for SqliteRemoteTargetRepository {
    async fn create(&self, target: &NewRemoteTarget) -> DomainResult<RemoteTarget> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"INSERT INTO remote_targets (name, host, port, username, ssh_key_path, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#
        )
        .bind(&target.name)
        .bind(&target.host)
        .bind(i64::from(target.port))
        .bind(&target.username)
        .bind(&target.ssh_key_path)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| super::map_unique_violation(e, || format!("Remote config '{}' already exists", target.name)))?;

        Ok(RemoteTarget {
            id: result.last_insert_rowid(),
            name: target.name.clone(),
            host: target.host.clone(),
            port: target.port,
            username: target.username.clone(),
            ssh_key_path: target.ssh_key_path.clone(),
            created_at,
        })
    }

    async fn list(&self) -> DomainResult<Vec<RemoteTarget>> {
        let rows: Vec<RemoteTargetRow> = sqlx::query_as("SELECT * FROM remote_targets ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct RemoteTargetRow {
    id: i64,
    name: String,
    host: String,
    port: i64,
    username: String,
    ssh_key_path: Option<String>,
    created_at: String,
}

impl TryFrom<RemoteTargetRow> for RemoteTarget {
    type Error = DomainError;

    fn try_from(row: RemoteTargetRow) -> Result<Self, Self::Error> {
        let port = super::parse_port(Some(row.port))?.unwrap_or_default();
        Ok(RemoteTarget {
            id: row.id,
            name: row.name,
            host: row.host,
            port,
            username: row.username,
            ssh_key_path: row.ssh_key_path,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    fn target(name: &str) -> NewRemoteTarget {
        NewRemoteTarget {
            name: name.to_string(),
            host: "10.0.0.5".to_string(),
            port: 22,
            username: "deploy".to_string(),
            ssh_key_path: Some("~/.ssh/id_ed25519".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let repo = SqliteRemoteTargetRepository::new(create_migrated_test_pool().await.unwrap());

        repo.create(&target("edge-1")).await.unwrap();
        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].port, 22);
        assert_eq!(listed[0].ssh_key_path.as_deref(), Some("~/.ssh/id_ed25519"));
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = SqliteRemoteTargetRepository::new(create_migrated_test_pool().await.unwrap());
        repo.create(&target("edge-1")).await.unwrap();
        assert!(matches!(repo.create(&target("edge-1")).await, Err(DomainError::Conflict(_))));
    }
}
