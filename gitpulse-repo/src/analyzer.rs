//! Single-repository analyzer
//!
//! Acquire, query, parse, assemble. Any failure deletes the working copy so
//! the next attempt starts from a fresh clone.

use crate::acquisition::AcquisitionManager;
use crate::history::{HistoryExtractor, RawAuthorHistory};
use crate::parser::{
    first_and_last_dates, merge_authors_by_email, parse_author_listing, parse_commit_log,
    parse_shortstat, AuthorCount,
};
use gitpulse_core::{
    performance, AnalysisResult, CommitRecord, ContributorRecord, GitExecutor, GitPulseConfig,
    GitPulseResult, RepositoryRef, RepositorySummary, RECENT_COMMIT_LIMIT,
};
use std::sync::Arc;
use tracing::{info, warn};

pub struct RepositoryAnalyzer {
    acquisition: AcquisitionManager,
    history: HistoryExtractor,
}

impl RepositoryAnalyzer {
    pub fn new(git: Arc<dyn GitExecutor>, config: &GitPulseConfig) -> Self {
        Self {
            acquisition: AcquisitionManager::new(Arc::clone(&git))
                .with_clone_depth(config.git.clone_depth),
            history: HistoryExtractor::new(git, config.batch.author_query_concurrency),
        }
    }

    pub fn acquisition(&self) -> &AcquisitionManager {
        &self.acquisition
    }

    /// Analyze one repository end to end.
    ///
    /// On error the working copy is removed before the error is returned.
    pub async fn analyze(&self, repo: &RepositoryRef) -> GitPulseResult<AnalysisResult> {
        let outcome = performance::measure_async("analyze_repository", self.run(repo)).await;

        if let Err(error) = &outcome {
            warn!(
                repo_url = %repo.remote_url,
                step = ?error.step(),
                "🧹 Analysis failed, removing working copy"
            );
            if let Err(cleanup_error) = self.acquisition.remove_working_copy(repo).await {
                warn!(
                    local_path = %repo.local_path.display(),
                    error = %cleanup_error,
                    "Could not remove working copy"
                );
            }
        }

        outcome
    }

    async fn run(&self, repo: &RepositoryRef) -> GitPulseResult<AnalysisResult> {
        let acquired = self.acquisition.ensure_ready(repo).await?;
        info!(repo_url = %repo.remote_url, outcome = ?acquired, "Working copy ready");

        let raw = self.history.extract(repo).await?;
        let authors = merge_authors_by_email(parse_author_listing(&raw.author_listing));
        let commits = parse_commit_log(&raw.commit_log);

        let emails = authors.iter().map(|a| a.email.clone()).collect();
        let details = self.history.author_details(repo, emails).await?;
        let contributors = authors
            .into_iter()
            .zip(details)
            .map(|(author, detail)| contributor_record(author, &detail))
            .collect();

        let result = assemble_result(repo, contributors, commits);
        info!(
            repo_url = %repo.remote_url,
            total_commits = result.summary.total_commits,
            total_contributors = result.summary.total_contributors,
            "📊 Analysis complete"
        );
        Ok(result)
    }
}

fn contributor_record(author: AuthorCount, detail: &RawAuthorHistory) -> ContributorRecord {
    let changes = parse_shortstat(&detail.shortstat);
    let (first_commit_date, last_commit_date) = first_and_last_dates(&detail.dates);

    ContributorRecord {
        name: author.name,
        email: author.email,
        commit_count: author.commit_count,
        additions: changes.additions,
        deletions: changes.deletions,
        first_commit_date,
        last_commit_date,
    }
}

/// Build the result from parsed records.
///
/// Contributors are sorted by commit count, highest first; equal counts keep
/// their listing order. `commits` must be newest first.
pub fn assemble_result(
    repo: &RepositoryRef,
    mut contributors: Vec<ContributorRecord>,
    commits: Vec<CommitRecord>,
) -> AnalysisResult {
    contributors.sort_by(|a, b| b.commit_count.cmp(&a.commit_count));

    let summary = RepositorySummary::from_commits(&commits, contributors.len());
    let recent_commits = commits.into_iter().take(RECENT_COMMIT_LIMIT).collect();

    AnalysisResult {
        summary,
        contributors,
        recent_commits,
        repository_path: repo.local_path.display().to_string(),
        remote_url: repo.remote_url.clone(),
    }
}
