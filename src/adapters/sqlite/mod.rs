//! SQLite adapters backing the catalog store.

pub mod agent_repository;
pub mod association_repository;
pub mod connection;
pub mod deployment_repository;
pub mod migrations;
pub mod remote_target_repository;
pub mod tool_repository;

pub use agent_repository::SqliteAgentRepository;
pub use association_repository::SqliteAssociationRepository;
pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use deployment_repository::SqliteDeploymentRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use remote_target_repository::SqliteRemoteTargetRepository;
pub use tool_repository::SqliteToolRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a JSON string from a SQLite row field, falling back to the type's default.
pub fn parse_json_or_default<T: serde::de::DeserializeOwned + Default>(s: Option<String>) -> DomainResult<T> {
    s.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(Option::unwrap_or_default)
}

/// Parse a port column.
pub fn parse_port(port: Option<i64>) -> DomainResult<Option<u16>> {
    port.map(|p| {
        u16::try_from(p).map_err(|_| DomainError::SerializationError(format!("Invalid port: {p}")))
    })
    .transpose()
}

/// Map a unique-constraint violation to `Conflict`, anything else to a database error.
pub fn map_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> String) -> DomainError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DomainError::Conflict(conflict()),
        _ => DomainError::from(err),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}
