//! `/deployments` endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiResult;
use super::server::AppState;
use crate::domain::models::{Deployment, DeploymentStatus, DeploymentType};
use crate::domain::ports::DeploymentFilter;

/// Request to deploy an agent.
#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    pub agent_id: Uuid,
    #[serde(default)]
    pub deployment_type: DeploymentType,
}

/// Immediate answer to a deployment request; the pipeline continues in the
/// background.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentAccepted {
    pub deployment_id: Uuid,
    pub status: DeploymentStatus,
}

/// Query parameters for deployment listing.
#[derive(Debug, Default, Deserialize)]
pub struct DeploymentQueryParams {
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<DeploymentStatus>,
}

/// Response with a deployment.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentResponse {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub deployment_type: DeploymentType,
    pub status: DeploymentStatus,
    pub deployment_path: String,
    pub port: Option<u16>,
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Deployment> for DeploymentResponse {
    fn from(d: Deployment) -> Self {
        Self {
            id: d.id,
            agent_id: d.agent_id,
            deployment_type: d.deployment_type,
            status: d.status,
            deployment_path: d.deployment_path.display().to_string(),
            port: d.port,
            error_message: d.error_message,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

pub async fn create_deployment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDeploymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<DeploymentAccepted>)> {
    let Json(req) = payload?;
    let started = state.deployments.start(req.agent_id, req.deployment_type).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DeploymentAccepted {
            deployment_id: started.deployment.id,
            status: started.deployment.status,
        }),
    ))
}

pub async fn list_deployments(
    State(state): State<Arc<AppState>>,
    params: Result<Query<DeploymentQueryParams>, QueryRejection>,
) -> ApiResult<Json<Vec<DeploymentResponse>>> {
    let Query(params) = params?;
    let deployments = state
        .deployments
        .list(DeploymentFilter {
            agent_id: params.agent_id,
            status: params.status,
        })
        .await?;
    Ok(Json(deployments.into_iter().map(DeploymentResponse::from).collect()))
}

pub async fn get_deployment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeploymentResponse>> {
    Ok(Json(state.deployments.get(id).await?.into()))
}
