//! HTTP server: shared state, router and listener.

use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{agents, deployments, live_logs, remote_configs, tools};
use crate::domain::models::ServerConfig;
use crate::services::{AgentService, DeploymentService, LiveLogRegistry, RemoteTargetService, ToolService};

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub tools: ToolService,
    pub agents: AgentService,
    pub deployments: DeploymentService,
    pub remote_targets: RemoteTargetService,
    pub live_logs: Arc<LiveLogRegistry>,
}

/// Build the API router.
pub fn build_router(state: Arc<AppState>, enable_cors: bool) -> Router {
    let app = Router::new()
        // Tool registry
        .route("/tools", post(tools::create_tool).get(tools::list_tools))
        .route("/tools/{id}", get(tools::get_tool).delete(tools::delete_tool))
        // Agents
        .route("/agents", post(agents::create_agent).get(agents::list_agents))
        .route(
            "/agents/{id}",
            get(agents::get_agent).put(agents::update_agent).delete(agents::delete_agent),
        )
        // Tool associations
        .route("/agents/{id}/mcp-tools", post(agents::attach_tool))
        .route("/agents/{id}/mcp-tools/{association_id}", delete(agents::detach_tool))
        // Deployments
        .route(
            "/deployments",
            post(deployments::create_deployment).get(deployments::list_deployments),
        )
        .route("/deployments/{id}", get(deployments::get_deployment))
        // Remote targets
        .route(
            "/remote-configs",
            post(remote_configs::create_remote_config).get(remote_configs::list_remote_configs),
        )
        // Live logs
        .route("/ws/logs/{client_id}", get(live_logs::live_logs))
        // Health check
        .route("/health", get(health_check))
        .with_state(state);

    if enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// API server bound to the configured address.
pub struct ApiServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = build_router(self.state, self.config.enable_cors);

        tracing::info!("agentdeck API listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
