//! Agent runtime port.
//!
//! The deployment orchestrator drives an isolated runtime through three
//! external steps: environment creation, batch package install, and process
//! launch.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Result of a bounded external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded,
    Failed { code: Option<i32>, stderr: String },
    TimedOut(Duration),
}

impl CommandOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed { code: Some(code), stderr } if !stderr.is_empty() => {
                write!(f, "exited with status {code}: {stderr}")
            }
            Self::Failed { code: Some(code), .. } => write!(f, "exited with status {code}"),
            Self::Failed { code: None, stderr } if !stderr.is_empty() => {
                write!(f, "terminated by signal: {stderr}")
            }
            Self::Failed { code: None, .. } => f.write_str("terminated by signal"),
            Self::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
        }
    }
}

/// Isolated runtime the orchestrator provisions for each deployment.
///
/// `deployment_dir` is the directory exclusively owned by one deployment.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Create the isolated environment inside `deployment_dir`.
    async fn provision(&self, deployment_dir: &Path) -> io::Result<CommandOutcome>;

    /// Install all `packages` into the environment in one batch.
    async fn install(&self, deployment_dir: &Path, packages: &[String]) -> io::Result<CommandOutcome>;

    /// Start `script` with the environment's interpreter without waiting for
    /// it. Returns the process id when the platform reports one.
    async fn launch(&self, deployment_dir: &Path, script: &Path, port: u16) -> io::Result<Option<u32>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(CommandOutcome::Succeeded.to_string(), "succeeded");
        assert_eq!(
            CommandOutcome::Failed { code: Some(1), stderr: "no such package".to_string() }.to_string(),
            "exited with status 1: no such package"
        );
        assert_eq!(
            CommandOutcome::TimedOut(Duration::from_secs(30)).to_string(),
            "timed out after 30s"
        );
        assert!(!CommandOutcome::TimedOut(Duration::from_secs(1)).is_success());
    }
}
