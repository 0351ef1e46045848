//! System git executor
//!
//! Shells out to the git binary with `tokio::process`. Every invocation that
//! targets a repository passes `-C <path>`, so the process working directory
//! is never read or changed.

use gitpulse_core::{
    with_timeout, CommandOutput, ErrorContext, GitConfig, GitExecutor, GitPulseError,
    GitPulseResult,
};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// [`GitExecutor`] backed by the git binary on this system
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: String,
    timeout: Option<Duration>,
}

impl SystemGit {
    /// Locate git and confirm it runs.
    ///
    /// Fails with `ToolMissing` when the binary cannot be spawned or
    /// `git --version` exits non-zero.
    pub async fn detect(config: &GitConfig) -> GitPulseResult<Self> {
        let git = Self {
            binary: config.binary.clone(),
            timeout: config.command_timeout(),
        };

        let missing = |message: String| GitPulseError::ToolMissing {
            binary: config.binary.clone(),
            message,
            context: ErrorContext::new("system_git")
                .with_operation("detect")
                .with_suggestion("Install git and make sure it is on PATH")
                .with_suggestion("Or point git.binary at the executable in the config file"),
        };

        let output = git.execute(None, &["--version"]).await.map_err(|e| missing(e.to_string()))?;
        if !output.success() {
            return Err(missing(output.diagnostic()));
        }

        debug!(binary = %git.binary, version = %output.stdout.trim(), "🔧 Found git");
        Ok(git)
    }

    async fn execute(&self, repo: Option<&Path>, args: &[&str]) -> GitPulseResult<CommandOutput> {
        let mut cmd = Command::new(&self.binary);
        if let Some(repo) = repo {
            cmd.arg("-C").arg(repo);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            repo = ?repo.map(|p| p.display().to_string()),
            args = ?args,
            "Running git"
        );

        let spawn_failed = |e: std::io::Error| GitPulseError::Internal {
            message: format!("Failed to execute {} {}: {}", self.binary, args.join(" "), e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("system_git")
                .with_operation("spawn")
                .with_suggestion("Ensure git is installed and accessible"),
        };

        let output = match self.timeout {
            Some(limit) => {
                let operation = format!("git {}", args.join(" "));
                with_timeout(cmd.output(), limit, &operation)
                    .await?
                    .map_err(spawn_failed)?
            }
            None => cmd.output().await.map_err(spawn_failed)?,
        };

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[async_trait::async_trait]
impl GitExecutor for SystemGit {
    async fn run(&self, repo: Option<&Path>, args: &[&str]) -> GitPulseResult<CommandOutput> {
        self.execute(repo, args).await
    }
}
