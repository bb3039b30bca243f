//! Scripted runtime for tests.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::ports::{AgentRuntime, CommandOutcome};

/// One call observed by [`MockRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Provision(PathBuf),
    Install(PathBuf, Vec<String>),
    Launch { dir: PathBuf, script: PathBuf, port: u16 },
}

/// Runtime whose step outcomes are fixed up front and whose calls are
/// recorded for inspection.
pub struct MockRuntime {
    provision: CommandOutcome,
    install: CommandOutcome,
    launch_error: Option<String>,
    delay: Duration,
    calls: Mutex<Vec<RuntimeCall>>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    /// Runtime where every step succeeds.
    pub fn new() -> Self {
        Self {
            provision: CommandOutcome::Succeeded,
            install: CommandOutcome::Succeeded,
            launch_error: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_provision(mut self, outcome: CommandOutcome) -> Self {
        self.provision = outcome;
        self
    }

    pub fn with_install(mut self, outcome: CommandOutcome) -> Self {
        self.install = outcome;
        self
    }

    pub fn with_launch_error(mut self, message: impl Into<String>) -> Self {
        self.launch_error = Some(message.into());
        self
    }

    /// Sleep this long inside every step.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    async fn record(&self, call: RuntimeCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl AgentRuntime for MockRuntime {
    async fn provision(&self, deployment_dir: &Path) -> io::Result<CommandOutcome> {
        tokio::fs::create_dir_all(deployment_dir).await?;
        self.record(RuntimeCall::Provision(deployment_dir.to_path_buf())).await;
        Ok(self.provision.clone())
    }

    async fn install(&self, deployment_dir: &Path, packages: &[String]) -> io::Result<CommandOutcome> {
        self.record(RuntimeCall::Install(deployment_dir.to_path_buf(), packages.to_vec()))
            .await;
        Ok(self.install.clone())
    }

    async fn launch(&self, deployment_dir: &Path, script: &Path, port: u16) -> io::Result<Option<u32>> {
        self.record(RuntimeCall::Launch {
            dir: deployment_dir.to_path_buf(),
            script: script.to_path_buf(),
            port,
        })
        .await;
        match &self.launch_error {
            Some(message) => Err(io::Error::new(io::ErrorKind::NotFound, message.clone())),
            None => Ok(Some(4242)),
        }
    }
}
