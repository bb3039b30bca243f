//! Remote deployment target records.

use std::sync::Arc;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewRemoteTarget, RemoteTarget};
use crate::domain::ports::RemoteTargetRepository;

pub struct RemoteTargetService {
    repository: Arc<dyn RemoteTargetRepository>,
}

impl RemoteTargetService {
    pub fn new(repository: Arc<dyn RemoteTargetRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, target: NewRemoteTarget) -> DomainResult<RemoteTarget> {
        if target.name.trim().is_empty() {
            return Err(DomainError::ValidationFailed("Remote config name cannot be empty".to_string()));
        }
        if target.host.trim().is_empty() {
            return Err(DomainError::ValidationFailed("Remote config host cannot be empty".to_string()));
        }

        let target = self.repository.create(&target).await?;
        info!(remote_id = target.id, name = %target.name, "Stored remote config");
        Ok(target)
    }

    pub async fn list(&self) -> DomainResult<Vec<RemoteTarget>> {
        self.repository.list().await
    }
}
