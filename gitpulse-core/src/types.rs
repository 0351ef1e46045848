//! Core data type definitions

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of newest commits kept in [`AnalysisResult::recent_commits`]
pub const RECENT_COMMIT_LIMIT: usize = 10;

/// A remote repository and the place its working copy lives on disk.
///
/// Built once from a remote URL and never mutated afterwards; `local_path`
/// is always `<root>/<owner_id>/<repo_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub owner_id: String,
    pub repo_id: String,
    pub remote_url: String,
    pub local_path: PathBuf,
}

impl RepositoryRef {
    pub fn new(owner_id: &str, repo_id: &str, remote_url: &str, root: &std::path::Path) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            repo_id: repo_id.to_string(),
            remote_url: remote_url.to_string(),
            local_path: root.join(owner_id).join(repo_id),
        }
    }

    /// `owner/repo`
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.owner_id, self.repo_id)
    }
}

/// One commit of the default branch, newest first in any list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub message: String,
}

/// Per-author totals, keyed by email
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorRecord {
    pub name: String,
    pub email: String,
    pub commit_count: u64,
    pub additions: u64,
    pub deletions: u64,
    pub first_commit_date: String,
    pub last_commit_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub total_commits: usize,
    pub total_contributors: usize,
    pub first_commit_date: String,
    pub last_commit_date: String,
}

impl RepositorySummary {
    /// Derive the summary from a newest-first commit list
    pub fn from_commits(commits: &[CommitRecord], total_contributors: usize) -> Self {
        Self {
            total_commits: commits.len(),
            total_contributors,
            first_commit_date: commits.last().map(|c| c.date.clone()).unwrap_or_default(),
            last_commit_date: commits.first().map(|c| c.date.clone()).unwrap_or_default(),
        }
    }
}

/// The output unit for one analyzed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: RepositorySummary,
    /// Sorted by `commit_count`, highest first
    pub contributors: Vec<ContributorRecord>,
    pub recent_commits: Vec<CommitRecord>,
    pub repository_path: String,
    pub remote_url: String,
}

/// A repository that dropped out of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub remote_url: String,
    pub step: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
}

/// Successful results plus the failures that were skipped over
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.failures.is_empty()
    }
}

/// Persisted JSON shape of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub repositories: Vec<AnalysisResult>,
    pub failures: Vec<BatchFailure>,
}
