//! Core trait definitions

use crate::error::GitPulseResult;
use async_trait::async_trait;
use std::path::Path;

/// Captured result of one finished version-control command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stderr if present, otherwise stdout, otherwise the exit status
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.status {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs the version-control tool.
///
/// Every call names the repository it targets explicitly; implementations must
/// never depend on the process working directory.
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Run `git [-C repo] <args>` and capture its output.
    ///
    /// A non-zero exit is not an error here; callers map it to the failing step.
    async fn run(&self, repo: Option<&Path>, args: &[&str]) -> GitPulseResult<CommandOutput>;
}
