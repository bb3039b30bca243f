use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a deployment.
///
/// `Deploying` is the only initial state. `Running` and `Error` are terminal
/// for the orchestrator. `Stopped` is a recognised value that nothing
/// currently transitions into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Deploying,
    Running,
    Stopped,
    Error,
}

impl DeploymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deploying => "deploying",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Error => "error",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Deploying)
    }

    /// Whether the orchestrator may move a deployment from `self` to `next`.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Deploying, Self::Running) | (Self::Deploying, Self::Error)
        )
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deploying" => Ok(Self::Deploying),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "error" => Ok(Self::Error),
            _ => Err(anyhow::anyhow!("Invalid deployment status: {s}")),
        }
    }
}

/// Where a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    #[default]
    Local,
    Remote,
}

impl DeploymentType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(anyhow::anyhow!("Invalid deployment type: {s}")),
        }
    }
}

/// One attempt to run an agent as a live process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub deployment_type: DeploymentType,
    pub status: DeploymentStatus,
    /// Isolated environment directory owned by this deployment
    pub deployment_path: PathBuf,
    /// Assigned once the deployment reaches `running`
    pub port: Option<u16>,
    /// Failure reason once the deployment reaches `error`
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// New deployment in the `deploying` state, rooted under `root_dir`.
    pub fn new(agent_id: Uuid, deployment_type: DeploymentType, root_dir: &std::path::Path) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            agent_id,
            deployment_type,
            status: DeploymentStatus::Deploying,
            deployment_path: root_dir.join(id.to_string()),
            port: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
