//! `/remote-configs` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiResult;
use super::server::AppState;
use crate::domain::models::{NewRemoteTarget, RemoteTarget};

#[derive(Debug, Deserialize)]
pub struct CreateRemoteConfigRequest {
    pub name: String,
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub ssh_key_path: Option<String>,
}

const fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoteConfigResponse {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub ssh_key_path: Option<String>,
    pub created_at: String,
}

impl From<RemoteTarget> for RemoteConfigResponse {
    fn from(t: RemoteTarget) -> Self {
        Self {
            id: t.id,
            name: t.name,
            host: t.host,
            port: t.port,
            username: t.username,
            ssh_key_path: t.ssh_key_path,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

pub async fn create_remote_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateRemoteConfigRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RemoteConfigResponse>)> {
    let Json(req) = payload?;
    let target = state
        .remote_targets
        .create(NewRemoteTarget {
            name: req.name,
            host: req.host,
            port: req.port,
            username: req.username,
            ssh_key_path: req.ssh_key_path,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(target.into())))
}

pub async fn list_remote_configs(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<RemoteConfigResponse>>> {
    let targets = state.remote_targets.list().await?;
    Ok(Json(targets.into_iter().map(RemoteConfigResponse::from).collect()))
}
