//! Acquisition manager
//!
//! Makes sure a working copy of a remote exists under its `local_path` and
//! matches the remote's default branch:
//!
//! - `Absent` (no directory or no `.git`): fresh clone
//! - `ValidExisting` (origin matches): fetch, resolve default branch, hard reset, clean
//! - `Stale` (origin differs): delete the directory, then fresh clone

use crate::parser::{is_valid_branch_name, parse_remote_head, parse_symbolic_head};
use crate::url::remotes_match;
use gitpulse_core::{
    CommandOutput, ErrorContext, GitExecutor, GitPulseError, GitPulseResult, RepositoryRef,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Branches probed, in order, when the remote HEAD cannot be read
const CONVENTIONAL_BRANCHES: [&str; 2] = ["main", "master"];

/// What is currently on disk at a repository's `local_path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingCopyState {
    Absent,
    ValidExisting,
    /// Origin points elsewhere, or could not be read
    Stale { found_remote: Option<String> },
}

/// How the working copy became ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    Cloned,
    Updated { branch: String },
    Recloned,
}

pub struct AcquisitionManager {
    git: Arc<dyn GitExecutor>,
    clone_depth: Option<u32>,
}

impl AcquisitionManager {
    pub fn new(git: Arc<dyn GitExecutor>) -> Self {
        Self {
            git,
            clone_depth: None,
        }
    }

    /// Shallow clones at `depth`; `None` keeps full history
    pub fn with_clone_depth(mut self, depth: Option<u32>) -> Self {
        self.clone_depth = depth;
        self
    }

    /// Bring the working copy of `repo` to the ready state
    pub async fn ensure_ready(&self, repo: &RepositoryRef) -> GitPulseResult<AcquisitionOutcome> {
        match self.inspect(repo).await? {
            WorkingCopyState::Absent => {
                info!(
                    repo_url = %repo.remote_url,
                    local_path = %repo.local_path.display(),
                    "📥 No working copy, cloning"
                );
                self.clone_fresh(repo).await?;
                Ok(AcquisitionOutcome::Cloned)
            }
            WorkingCopyState::ValidExisting => {
                info!(
                    repo_url = %repo.remote_url,
                    local_path = %repo.local_path.display(),
                    "📁 Working copy exists, updating"
                );
                let branch = self.update(repo).await?;
                Ok(AcquisitionOutcome::Updated { branch })
            }
            WorkingCopyState::Stale { found_remote } => {
                warn!(
                    repo_url = %repo.remote_url,
                    found_remote = ?found_remote,
                    local_path = %repo.local_path.display(),
                    "🔁 Working copy tracks a different remote, recloning"
                );
                self.remove_working_copy(repo).await?;
                self.clone_fresh(repo).await?;
                Ok(AcquisitionOutcome::Recloned)
            }
        }
    }

    pub async fn inspect(&self, repo: &RepositoryRef) -> GitPulseResult<WorkingCopyState> {
        let path = &repo.local_path;
        if !tokio::fs::try_exists(path).await? || !tokio::fs::try_exists(path.join(".git")).await? {
            return Ok(WorkingCopyState::Absent);
        }

        let output = self
            .git
            .run(Some(path), &["remote", "get-url", "origin"])
            .await?;

        if !output.success() {
            debug!(
                local_path = %path.display(),
                stderr = %output.stderr.trim(),
                "Could not read origin of existing working copy"
            );
            return Ok(WorkingCopyState::Stale { found_remote: None });
        }

        let found = output.stdout.trim();
        if remotes_match(found, &repo.remote_url) {
            Ok(WorkingCopyState::ValidExisting)
        } else {
            Ok(WorkingCopyState::Stale {
                found_remote: Some(found.to_string()),
            })
        }
    }

    /// Delete the working copy if it exists
    pub async fn remove_working_copy(&self, repo: &RepositoryRef) -> GitPulseResult<()> {
        if tokio::fs::try_exists(&repo.local_path).await? {
            debug!(local_path = %repo.local_path.display(), "🗑️ Removing working copy");
            tokio::fs::remove_dir_all(&repo.local_path).await?;
        }
        Ok(())
    }

    async fn clone_fresh(&self, repo: &RepositoryRef) -> GitPulseResult<()> {
        let target = &repo.local_path;

        // A directory without .git metadata would make clone refuse the target
        self.remove_working_copy(repo).await?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let depth = self.clone_depth.map(|d| d.to_string());
        let target_arg = target.to_string_lossy();
        let mut args = vec!["clone"];
        if let Some(depth) = depth.as_deref() {
            args.extend(["--depth", depth]);
        }
        args.extend(["--", repo.remote_url.as_str(), &*target_arg]);

        let output = self.git.run(None, &args).await?;
        if !output.success() {
            return Err(GitPulseError::CloneFailed {
                repository: repo.remote_url.clone(),
                message: output.diagnostic(),
                context: step_context("clone", repo)
                    .with_suggestion("Check the repository URL and your network access"),
            });
        }

        info!(
            repo_url = %repo.remote_url,
            local_path = %target.display(),
            "✅ Repository cloned"
        );
        Ok(())
    }

    async fn update(&self, repo: &RepositoryRef) -> GitPulseResult<String> {
        let path = repo.local_path.as_path();

        let output = self.run(path, &["fetch", "--all", "--tags"]).await?;
        if !output.success() {
            return Err(GitPulseError::FetchFailed {
                repository: repo.remote_url.clone(),
                message: output.diagnostic(),
                context: step_context("fetch", repo),
            });
        }

        let branch = self.resolve_default_branch(repo).await?;
        let target = format!("origin/{}", branch);

        let output = self.run(path, &["reset", "--hard", target.as_str()]).await?;
        if !output.success() {
            return Err(GitPulseError::ResetFailed {
                repository: repo.remote_url.clone(),
                branch,
                message: output.diagnostic(),
                context: step_context("reset", repo),
            });
        }

        let output = self.run(path, &["clean", "-fd"]).await?;
        if !output.success() {
            return Err(GitPulseError::CleanFailed {
                repository: repo.remote_url.clone(),
                message: output.diagnostic(),
                context: step_context("clean", repo),
            });
        }

        info!(
            repo_url = %repo.remote_url,
            branch = %branch,
            "✅ Working copy reset to remote default branch"
        );
        Ok(branch)
    }

    /// Find the remote's default branch.
    ///
    /// Tries the advertised remote HEAD, then the local `origin/HEAD` symbolic
    /// ref, then `main` and `master`. Only names matching `^[A-Za-z0-9_.-]+$`
    /// are ever returned.
    pub async fn resolve_default_branch(&self, repo: &RepositoryRef) -> GitPulseResult<String> {
        let path = repo.local_path.as_path();

        let output = self
            .run(path, &["ls-remote", "--symref", "origin", "HEAD"])
            .await?;
        if let Some(branch) = accept_branch(&output, parse_remote_head, "ls-remote") {
            return Ok(branch);
        }

        let output = self
            .run(path, &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
            .await?;
        if let Some(branch) = accept_branch(&output, parse_symbolic_head, "symbolic-ref") {
            return Ok(branch);
        }

        for candidate in CONVENTIONAL_BRANCHES {
            let reference = format!("refs/remotes/origin/{}", candidate);
            let output = self
                .run(path, &["rev-parse", "--verify", "--quiet", reference.as_str()])
                .await?;
            if output.success() {
                debug!(branch = candidate, "Default branch found by probing");
                return Ok(candidate.to_string());
            }
        }

        Err(GitPulseError::UnresolvableBranch {
            repository: repo.remote_url.clone(),
            context: step_context("resolve_default_branch", repo)
                .with_suggestion("Make sure the remote has a default branch named with [A-Za-z0-9_.-]"),
        })
    }

    async fn run(&self, path: &Path, args: &[&str]) -> GitPulseResult<CommandOutput> {
        self.git.run(Some(path), args).await
    }
}

fn accept_branch(
    output: &CommandOutput,
    parse: fn(&str) -> Option<String>,
    method: &str,
) -> Option<String> {
    if !output.success() {
        debug!(method, stderr = %output.stderr.trim(), "Branch lookup failed");
        return None;
    }

    let branch = parse(&output.stdout)?;
    if is_valid_branch_name(&branch) {
        debug!(method, branch = %branch, "Default branch resolved");
        Some(branch)
    } else {
        warn!(method, branch = ?branch, "⚠️ Rejected branch name outside the allow-list");
        None
    }
}

fn step_context(step: &str, repo: &RepositoryRef) -> ErrorContext {
    ErrorContext::new("acquisition_manager")
        .with_operation(step)
        .with_metadata("repository", &repo.display_name())
        .with_metadata("local_path", &repo.local_path.display().to_string())
}
