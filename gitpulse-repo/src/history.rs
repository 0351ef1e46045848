//! History extractor
//!
//! Issues the raw history queries against a ready working copy and returns
//! their text unparsed.

use gitpulse_core::{process_bounded, ErrorContext, GitExecutor, GitPulseError, GitPulseResult, RepositoryRef};
use std::sync::Arc;
use tracing::debug;

/// `%H %an %ad %s` joined by the unit separator, see [`crate::parser::LOG_FIELD_DELIMITER`]
const COMMIT_LOG_FORMAT: &str = "--pretty=format:%H%x1f%an%x1f%ad%x1f%s";

/// Raw output of the two repository-wide queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHistory {
    pub author_listing: String,
    pub commit_log: String,
}

/// Raw output of the two per-author queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAuthorHistory {
    pub email: String,
    /// One `YYYY-MM-DD` per commit, oldest first
    pub dates: String,
    pub shortstat: String,
}

pub struct HistoryExtractor {
    git: Arc<dyn GitExecutor>,
    author_query_concurrency: usize,
}

impl HistoryExtractor {
    pub fn new(git: Arc<dyn GitExecutor>, author_query_concurrency: usize) -> Self {
        Self {
            git,
            author_query_concurrency: author_query_concurrency.max(1),
        }
    }

    /// Aggregate author listing and default-branch log, queried concurrently
    pub async fn extract(&self, repo: &RepositoryRef) -> GitPulseResult<RawHistory> {
        let (author_listing, commit_log) =
            tokio::try_join!(self.author_listing(repo), self.commit_log(repo))?;
        Ok(RawHistory {
            author_listing,
            commit_log,
        })
    }

    /// `count name <email>` per distinct author across all refs
    pub async fn author_listing(&self, repo: &RepositoryRef) -> GitPulseResult<String> {
        self.query(repo, "author_listing", &["shortlog", "-s", "-n", "-e", "--all"])
            .await
    }

    /// One delimited line per commit of the checked-out branch, newest first
    pub async fn commit_log(&self, repo: &RepositoryRef) -> GitPulseResult<String> {
        let args = ["log", COMMIT_LOG_FORMAT, "--date=short"];
        let output = self.git.run(Some(&repo.local_path), &args).await?;

        // A freshly cloned empty repository has no HEAD commit yet
        if !output.success() && output.stderr.contains("does not have any commits yet") {
            debug!(repo_url = %repo.remote_url, "Repository has no commits");
            return Ok(String::new());
        }

        check(repo, "commit_log", &args, output)
    }

    /// Commit dates of one author, oldest first
    pub async fn author_dates(&self, repo: &RepositoryRef, email: &str) -> GitPulseResult<String> {
        let author = author_filter(email);
        self.query(
            repo,
            "author_dates",
            &[
                "log",
                "--all",
                "--use-mailmap",
                "--fixed-strings",
                author.as_str(),
                "--reverse",
                "--pretty=format:%ad",
                "--date=short",
            ],
        )
        .await
    }

    /// Per-commit shortstat lines of one author
    pub async fn author_shortstat(&self, repo: &RepositoryRef, email: &str) -> GitPulseResult<String> {
        let author = author_filter(email);
        self.query(
            repo,
            "author_shortstat",
            &[
                "log",
                "--all",
                "--use-mailmap",
                "--fixed-strings",
                author.as_str(),
                "--shortstat",
                "--pretty=format:",
            ],
        )
        .await
    }

    /// Dates and shortstat for every email, at most `author_query_concurrency` at a time.
    ///
    /// Returns only once every query has finished; output order follows `emails`.
    pub async fn author_details(
        &self,
        repo: &RepositoryRef,
        emails: Vec<String>,
    ) -> GitPulseResult<Vec<RawAuthorHistory>> {
        debug!(
            repo_url = %repo.remote_url,
            authors = emails.len(),
            "Querying per-author history"
        );

        process_bounded(emails, self.author_query_concurrency, |email| async move {
            let (dates, shortstat) = tokio::try_join!(
                self.author_dates(repo, &email),
                self.author_shortstat(repo, &email)
            )?;
            Ok::<_, GitPulseError>(RawAuthorHistory {
                email,
                dates,
                shortstat,
            })
        })
        .await
        .into_iter()
        .collect()
    }

    async fn query(&self, repo: &RepositoryRef, step: &str, args: &[&str]) -> GitPulseResult<String> {
        let output = self.git.run(Some(&repo.local_path), args).await?;
        check(repo, step, args, output)
    }
}

/// Match the exact `<email>` part of the author line.
///
/// Paired with `--use-mailmap` so the filter sees the same canonical
/// identities `shortlog` reports. Older git releases ignore the mailmap when
/// matching `--author` and fall back to the raw commit header.
fn author_filter(email: &str) -> String {
    format!("--author=<{}>", email)
}

fn check(
    repo: &RepositoryRef,
    step: &str,
    args: &[&str],
    output: gitpulse_core::CommandOutput,
) -> GitPulseResult<String> {
    if output.success() {
        return Ok(output.stdout);
    }

    Err(GitPulseError::QueryFailed {
        repository: repo.remote_url.clone(),
        command: format!("git {}", args.join(" ")),
        message: output.diagnostic(),
        context: ErrorContext::new("history_extractor")
            .with_operation(step)
            .with_metadata("repository", &repo.display_name()),
    })
}
