//! `git` subprocess implementation of [`Git`].

use super::error::MirrorError;
use super::Git;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs the `git` binary found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

/// Runs a command and returns its combined output, failing on non-zero exit.
///
/// `label` is what appears in logs and errors; it must not contain
/// credentials.
async fn run(mut command: Command, label: &str) -> Result<String, MirrorError> {
    debug!(command = %label, "Running command");

    let output = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| MirrorError::Spawn {
            command: label.to_string(),
            source: e,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(MirrorError::CommandFailed {
            command: label.to_string(),
            output: combined,
        });
    }

    Ok(combined)
}

#[async_trait]
impl Git for GitCli {
    async fn mirror_clone(&self, url: &str, destination: &Path) -> Result<String, MirrorError> {
        let mut command = Command::new("git");
        command.arg("clone").arg("--mirror").arg(url).arg(destination);
        run(command, "git clone --mirror").await
    }

    async fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<String, MirrorError> {
        let mut command = Command::new("git");
        command
            .args(["remote", "add", name, url])
            .current_dir(repo);
        run(command, &format!("git remote add {name}")).await
    }

    async fn mirror_push(&self, repo: &Path, remote: &str) -> Result<String, MirrorError> {
        let mut command = Command::new("git");
        command
            .args(["push", "--mirror", remote])
            .current_dir(repo);
        run(command, &format!("git push --mirror {remote}")).await
    }

    async fn run_transform(&self, program: &Path, repo: &Path) -> Result<String, MirrorError> {
        let mut command = Command::new(program);
        command.arg(repo).current_dir(repo);
        run(command, &program.display().to_string()).await
    }
}
