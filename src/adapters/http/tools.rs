//! `/tools` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiResult;
use super::server::AppState;
use super::MessageResponse;
use crate::domain::models::{McpTool, NewMcpTool};

/// Request to register a tool.
#[derive(Debug, Deserialize)]
pub struct CreateToolRequest {
    pub name: String,
    #[serde(alias = "package_name")]
    pub package: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "env_variables")]
    pub required_env_names: Vec<String>,
}

/// Response with a tool.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: i64,
    pub name: String,
    pub package: String,
    pub description: String,
    pub required_env_names: Vec<String>,
    pub created_at: String,
}

impl From<McpTool> for ToolResponse {
    fn from(t: McpTool) -> Self {
        Self {
            id: t.id,
            name: t.name,
            package: t.package,
            description: t.description,
            required_env_names: t.required_env,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

pub async fn create_tool(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateToolRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ToolResponse>)> {
    let Json(req) = payload?;
    let tool = NewMcpTool::new(req.name, req.package)
        .with_description(req.description)
        .with_required_env(req.required_env_names);

    let tool = state.tools.register(tool).await?;
    Ok((StatusCode::CREATED, Json(tool.into())))
}

pub async fn list_tools(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<ToolResponse>>> {
    let tools = state.tools.list().await?;
    Ok(Json(tools.into_iter().map(ToolResponse::from).collect()))
}

pub async fn get_tool(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<Json<ToolResponse>> {
    Ok(Json(state.tools.get(id).await?.into()))
}

pub async fn delete_tool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.tools.delete(id).await?;
    Ok(Json(MessageResponse::new(format!("MCP tool {id} deleted"))))
}
