//! Implementation of the `agentdeck serve` command.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::http::ApiServer;
use crate::adapters::runtime::PythonVenvRuntime;
use crate::domain::models::Config;
use crate::infrastructure::setup::{build_app_state, open_database};

pub async fn execute(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let pool = open_database(&config).await?;
    let runtime = Arc::new(PythonVenvRuntime::from_config(&config.deployment));
    let state = build_app_state(pool.clone(), &config, runtime).context("Failed to prepare script template")?;

    state.deployments.restore_port_leases().await?;

    let server = ApiServer::new(config.server.clone(), Arc::new(state));
    server
        .serve_with_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
