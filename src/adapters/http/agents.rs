//! `/agents` endpoints, including tool associations.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiResult;
use super::server::AppState;
use super::MessageResponse;
use crate::domain::models::{
    AgentType, AgentUpdate, ResolvedAssociation, ToolAssociation, DEFAULT_POSITION_X, DEFAULT_POSITION_Y,
};
use crate::services::AgentDetails;

const fn default_position_x() -> i64 {
    DEFAULT_POSITION_X
}

const fn default_position_y() -> i64 {
    DEFAULT_POSITION_Y
}

/// Body of both agent creation and full-replace update.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentRequest {
    pub name: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(alias = "model_name")]
    pub model: String,
    #[serde(rename = "type", alias = "agent_type", default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub usecase_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    #[serde(default = "default_position_x")]
    pub position_x: i64,
    #[serde(default = "default_position_y")]
    pub position_y: i64,
}

impl From<AgentRequest> for AgentUpdate {
    fn from(req: AgentRequest) -> Self {
        Self {
            name: req.name,
            instruction: req.instruction,
            model: req.model,
            agent_type: req.agent_type,
            usecase_id: req.usecase_id,
            api_key: req.api_key,
            consumer_key: req.consumer_key,
            consumer_secret: req.consumer_secret,
            position_x: req.position_x,
            position_y: req.position_y,
        }
    }
}

/// Tool summary embedded in agent responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolSummary {
    pub id: i64,
    pub name: String,
    pub package: String,
}

/// One tool attached to an agent.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachedToolResponse {
    pub association_id: i64,
    pub mcp_tool: ToolSummary,
    pub env_values: BTreeMap<String, String>,
}

impl From<ResolvedAssociation> for AttachedToolResponse {
    fn from(r: ResolvedAssociation) -> Self {
        Self {
            association_id: r.association.id,
            mcp_tool: ToolSummary {
                id: r.tool.id,
                name: r.tool.name,
                package: r.tool.package,
            },
            env_values: r.association.env_values,
        }
    }
}

/// Response with an agent. Credential fields other than the use-case id are
/// never returned.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentResponse {
    pub id: Uuid,
    pub name: String,
    pub instruction: String,
    pub model: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub usecase_id: Option<String>,
    pub position_x: i64,
    pub position_y: i64,
    pub created_at: String,
    pub mcp_tools: Vec<AttachedToolResponse>,
}

impl From<AgentDetails> for AgentResponse {
    fn from(d: AgentDetails) -> Self {
        let AgentDetails { agent, tools } = d;
        Self {
            id: agent.id,
            name: agent.name,
            instruction: agent.instruction,
            model: agent.model,
            agent_type: agent.agent_type,
            usecase_id: agent.usecase_id,
            position_x: agent.position_x,
            position_y: agent.position_y,
            created_at: agent.created_at.to_rfc3339(),
            mcp_tools: tools.into_iter().map(AttachedToolResponse::from).collect(),
        }
    }
}

/// Request to attach a tool to an agent.
#[derive(Debug, Deserialize)]
pub struct AttachToolRequest {
    #[serde(alias = "mcp_tool_id")]
    pub tool_id: i64,
    #[serde(default)]
    pub env_values: BTreeMap<String, String>,
}

/// Response with a stored association.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssociationResponse {
    pub id: i64,
    pub agent_id: Uuid,
    pub tool_id: i64,
    pub env_values: BTreeMap<String, String>,
    pub created_at: String,
}

impl From<ToolAssociation> for AssociationResponse {
    fn from(a: ToolAssociation) -> Self {
        Self {
            id: a.id,
            agent_id: a.agent_id,
            tool_id: a.tool_id,
            env_values: a.env_values,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

pub async fn create_agent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AgentResponse>)> {
    let Json(req) = payload?;
    let details = state.agents.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

pub async fn list_agents(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<AgentResponse>>> {
    let agents = state.agents.list().await?;
    Ok(Json(agents.into_iter().map(AgentResponse::from).collect()))
}

pub async fn get_agent(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<Json<AgentResponse>> {
    Ok(Json(state.agents.get(id).await?.into()))
}

pub async fn update_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> ApiResult<Json<AgentResponse>> {
    let Json(req) = payload?;
    Ok(Json(state.agents.update(id, req.into()).await?.into()))
}

pub async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.agents.delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Agent {id} deleted"))))
}

pub async fn attach_tool(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<Uuid>,
    payload: Result<Json<AttachToolRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AssociationResponse>)> {
    let Json(req) = payload?;
    let association = state.agents.attach_tool(agent_id, req.tool_id, req.env_values).await?;
    Ok((StatusCode::CREATED, Json(association.into())))
}

pub async fn detach_tool(
    State(state): State<Arc<AppState>>,
    Path((agent_id, association_id)): Path<(Uuid, i64)>,
) -> ApiResult<Json<MessageResponse>> {
    state.agents.detach_tool(agent_id, association_id).await?;
    Ok(Json(MessageResponse::new("MCP tool removed from agent")))
}
