//! Domain errors for the agentdeck catalog and deployment pipeline.

use thiserror::Error;
use uuid::Uuid;

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

/// Rejection reasons produced when environment values are checked against a
/// tool's declared variables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvValidationError {
    #[error("Missing required environment variables: {}", join_names(.0))]
    Missing(Vec<String>),

    #[error("Unknown environment variables provided: {}", join_names(.0))]
    Unknown(Vec<String>),

    #[error("Empty values provided for environment variables: {}", join_names(.0))]
    Empty(Vec<String>),
}

impl EnvValidationError {
    /// Variable names carried by the error, sorted.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Missing(names) | Self::Unknown(names) | Self::Empty(names) => names,
        }
    }
}

/// Domain-level errors that can occur in agentdeck.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("MCP tool not found: {0}")]
    ToolNotFound(i64),

    #[error("Agent not found: {0}")]
    AgentNotFound(Uuid),

    #[error("Association {association_id} not found for agent {agent_id}")]
    AssociationNotFound { agent_id: Uuid, association_id: i64 },

    #[error("Deployment not found: {0}")]
    DeploymentNotFound(Uuid),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    InvalidEnvironment(#[from] EnvValidationError),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),
}

impl DomainError {
    /// Whether the error names an entity that does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_)
                | Self::AgentNotFound(_)
                | Self::AssociationNotFound { .. }
                | Self::DeploymentNotFound(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_validation_messages() {
        let err = EnvValidationError::Missing(vec!["API_KEY".to_string(), "TOKEN".to_string()]);
        assert_eq!(err.to_string(), "Missing required environment variables: API_KEY, TOKEN");

        let err = EnvValidationError::Unknown(vec!["EXTRA".to_string()]);
        assert_eq!(err.to_string(), "Unknown environment variables provided: EXTRA");

        let err = EnvValidationError::Empty(vec!["API_KEY".to_string()]);
        assert_eq!(err.to_string(), "Empty values provided for environment variables: API_KEY");
    }

    #[test]
    fn test_invalid_environment_is_transparent() {
        let err: DomainError = EnvValidationError::Unknown(vec!["X".to_string()]).into();
        assert_eq!(err.to_string(), "Unknown environment variables provided: X");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_variants() {
        assert!(DomainError::ToolNotFound(3).is_not_found());
        assert!(DomainError::AgentNotFound(Uuid::new_v4()).is_not_found());
        assert!(DomainError::DeploymentNotFound(Uuid::new_v4()).is_not_found());
        assert!(!DomainError::Conflict("dup".to_string()).is_not_found());
    }
}
