//! Remote target repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NewRemoteTarget, RemoteTarget};

#[async_trait]
pub trait RemoteTargetRepository: Send + Sync {
    async fn create(&self, target: &NewRemoteTarget) -> DomainResult<RemoteTarget>;

    async fn list(&self) -> DomainResult<Vec<RemoteTarget>>;
}
