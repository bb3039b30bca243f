//! Python virtual-environment runtime.
//!
//! Each deployment gets `<deployment_dir>/venv`. Packages are installed with
//! the environment's own `pip` and the agent script is started with the
//! environment's own interpreter.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::models::DeploymentConfig;
use crate::domain::ports::{AgentRuntime, CommandOutcome};

const VENV_DIR: &str = "venv";
const AGENT_LOG_FILE: &str = "agent.log";
const STDERR_TAIL_CHARS: usize = 2000;

#[cfg(windows)]
const VENV_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const VENV_BIN_DIR: &str = "bin";

/// Runtime backed by `python -m venv` and `pip`.
#[derive(Debug, Clone)]
pub struct PythonVenvRuntime {
    python: String,
    provision_timeout: Duration,
    install_timeout: Duration,
}

impl PythonVenvRuntime {
    pub fn new(python: impl Into<String>, provision_timeout: Duration, install_timeout: Duration) -> Self {
        Self {
            python: python.into(),
            provision_timeout,
            install_timeout,
        }
    }

    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(
            config.python.clone(),
            Duration::from_secs(config.provision_timeout_secs),
            Duration::from_secs(config.install_timeout_secs),
        )
    }

    fn venv_binary(deployment_dir: &Path, name: &str) -> PathBuf {
        deployment_dir.join(VENV_DIR).join(VENV_BIN_DIR).join(name)
    }
}

#[async_trait]
impl AgentRuntime for PythonVenvRuntime {
    async fn provision(&self, deployment_dir: &Path) -> io::Result<CommandOutcome> {
        tokio::fs::create_dir_all(deployment_dir).await?;

        let mut cmd = Command::new(&self.python);
        cmd.arg("-m").arg("venv").arg(deployment_dir.join(VENV_DIR));

        info!(dir = %deployment_dir.display(), "Creating virtual environment");
        run_bounded(cmd, self.provision_timeout).await
    }

    async fn install(&self, deployment_dir: &Path, packages: &[String]) -> io::Result<CommandOutcome> {
        let deployment_dir = std::path::absolute(deployment_dir)?;
        let mut cmd = Command::new(Self::venv_binary(&deployment_dir, "pip"));
        cmd.arg("install").args(packages).current_dir(&deployment_dir);

        info!(dir = %deployment_dir.display(), ?packages, "Installing packages");
        run_bounded(cmd, self.install_timeout).await
    }

    async fn launch(&self, deployment_dir: &Path, script: &Path, port: u16) -> io::Result<Option<u32>> {
        // The child starts inside `deployment_dir`, so relative paths would
        // resolve against it twice.
        let deployment_dir = std::path::absolute(deployment_dir)?;
        let script = std::path::absolute(script)?;
        let log = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(deployment_dir.join(AGENT_LOG_FILE))
            .await?
            .into_std()
            .await;
        let log_err = log.try_clone()?;

        let child = Command::new(Self::venv_binary(&deployment_dir, "python"))
            .arg(&script)
            .current_dir(&deployment_dir)
            .env("AGENT_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()?;

        let pid = child.id();
        info!(dir = %deployment_dir.display(), port, ?pid, "Launched agent process");
        Ok(pid)
    }
}

/// Run `cmd` to completion, killing it if `limit` elapses first.
///
/// Dropping the returned future also kills the child.
pub async fn run_bounded(mut cmd: Command, limit: Duration) -> io::Result<CommandOutcome> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Err(_) => {
            warn!(limit_secs = limit.as_secs(), "Command timed out and was killed");
            Ok(CommandOutcome::TimedOut(limit))
        }
        Ok(output) => {
            let output = output?;
            if output.status.success() {
                Ok(CommandOutcome::Succeeded)
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let stderr = tail(stderr.trim(), STDERR_TAIL_CHARS);
                debug!(code = ?output.status.code(), %stderr, "Command failed");
                Ok(CommandOutcome::Failed {
                    code: output.status.code(),
                    stderr,
                })
            }
        }
    }
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    text.chars().skip(count - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venv_binary_layout() {
        let pip = PythonVenvRuntime::venv_binary(Path::new("/srv/d1"), "pip");
        assert_eq!(pip, Path::new("/srv/d1").join("venv").join(VENV_BIN_DIR).join("pip"));
    }

    #[test]
    fn test_tail_keeps_last_chars() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("abc", 10), "abc");
        assert_eq!(tail("ééé", 2), "éé");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_bounded_success() {
        let cmd = Command::new("true");
        let outcome = run_bounded(cmd, Duration::from_secs(5)).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Succeeded);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_bounded_failure_captures_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo broken >&2; exit 3");
        let outcome = run_bounded(cmd, Duration::from_secs(5)).await.unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Failed {
                code: Some(3),
                stderr: "broken".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_bounded_times_out() {
        let mut cmd = Command::new("sleep");
        cmd.arg("5");
        let limit = Duration::from_millis(100);
        let outcome = run_bounded(cmd, limit).await.unwrap();
        assert_eq!(outcome, CommandOutcome::TimedOut(limit));
    }

    /// Lay out `<dir>/venv/bin/<name>` as an executable shell script.
    #[cfg(unix)]
    fn fake_venv_binary(dir: &Path, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = PythonVenvRuntime::venv_binary(dir, name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_relative_deployment_dir() {
        let root = tempfile::Builder::new().prefix("venv-rel").tempdir_in(".").unwrap();
        let dir = Path::new(".").join(root.path().file_name().unwrap()).join("d1");
        fake_venv_binary(&dir, "pip", r#"[ "$1" = install ] && [ "$2" = pkg-search ]"#);
        fake_venv_binary(&dir, "python", r#"[ -f "$1" ] && echo "$AGENT_PORT" > launched"#);
        std::fs::write(dir.join("agent.py"), "print('hi')\n").unwrap();

        let runtime = PythonVenvRuntime::new("python3", Duration::from_secs(5), Duration::from_secs(5));
        let outcome = runtime.install(&dir, &["pkg-search".to_string()]).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Succeeded);

        let pid = runtime.launch(&dir, &dir.join("agent.py"), 8123).await.unwrap();
        assert!(pid.is_some());

        let marker = dir.join("launched");
        for _ in 0..100 {
            if std::fs::read_to_string(&marker).is_ok_and(|s| s.trim() == "8123") {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("agent script was not started from {}", dir.display());
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = PythonVenvRuntime::new(
            "definitely-not-a-python-binary",
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        assert!(runtime.provision(dir.path()).await.is_err());
    }
}
