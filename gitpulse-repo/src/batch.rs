//! Batch coordinator
//!
//! Runs the analyzer over many repositories. A failing repository is logged
//! and left out of the results; it never stops the rest of the batch.

use crate::analyzer::RepositoryAnalyzer;
use crate::url::repository_ref;
use gitpulse_core::{
    config_error, process_in_chunks, AnalysisResult, BatchConfig, BatchFailure, BatchMode,
    BatchReport, ErrorContext, GitPulseError, GitPulseResult, RepositoryRef,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct BatchCoordinator {
    analyzer: RepositoryAnalyzer,
    mode: BatchMode,
    concurrency: usize,
    origin_dir: Option<PathBuf>,
}

impl BatchCoordinator {
    /// `concurrency` only matters in parallel mode but must be at least 1 either way
    pub fn new(
        analyzer: RepositoryAnalyzer,
        mode: BatchMode,
        concurrency: usize,
    ) -> GitPulseResult<Self> {
        if concurrency == 0 {
            return Err(config_error!(
                "batch concurrency must be at least 1",
                "batch_coordinator"
            ));
        }

        Ok(Self {
            analyzer,
            mode,
            concurrency,
            origin_dir: std::env::current_dir().ok(),
        })
    }

    pub fn from_config(analyzer: RepositoryAnalyzer, config: &BatchConfig) -> GitPulseResult<Self> {
        Self::new(analyzer, config.mode, config.concurrency)
    }

    /// Build every reference up front; one malformed URL fails the whole batch
    /// before any repository is touched.
    ///
    /// Two URLs that resolve to the same working copy (the same repository in
    /// https and ssh form, or equal owner/repo on different hosts) are rejected
    /// too, since their acquisitions would race on one directory.
    pub fn prepare<S: AsRef<str>>(urls: &[S], root: &Path) -> GitPulseResult<Vec<RepositoryRef>> {
        let repos = urls
            .iter()
            .map(|url| repository_ref(url.as_ref(), root))
            .collect::<GitPulseResult<Vec<_>>>()?;

        let mut claimed: HashMap<&Path, &str> = HashMap::with_capacity(repos.len());
        for repo in &repos {
            if let Some(first) = claimed.insert(repo.local_path.as_path(), &repo.remote_url) {
                return Err(GitPulseError::Config {
                    message: format!(
                        "'{}' and '{}' share the working copy {}",
                        first,
                        repo.remote_url,
                        repo.local_path.display()
                    ),
                    source: None,
                    context: ErrorContext::new("batch_coordinator")
                        .with_operation("prepare")
                        .with_metadata("local_path", &repo.local_path.display().to_string())
                        .with_suggestion("List each repository only once per batch"),
                });
            }
        }

        Ok(repos)
    }

    pub async fn run(&self, repos: &[RepositoryRef]) -> BatchReport {
        info!(
            repositories = repos.len(),
            mode = ?self.mode,
            concurrency = self.concurrency,
            "🚀 Starting batch analysis"
        );

        let outcomes = match self.mode {
            BatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(repos.len());
                for repo in repos {
                    outcomes.push(self.analyze_one(repo).await);
                }
                outcomes
            }
            BatchMode::Parallel => {
                process_in_chunks(repos, self.concurrency, |repo| self.analyze_one(repo)).await
            }
        };

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(result) => report.results.push(result),
                Err(failure) => report.failures.push(failure),
            }
        }

        info!(
            succeeded = report.results.len(),
            failed = report.failures.len(),
            "🏁 Batch analysis finished"
        );
        report
    }

    async fn analyze_one(&self, repo: &RepositoryRef) -> Result<AnalysisResult, BatchFailure> {
        let outcome = self.analyzer.analyze(repo).await;
        self.restore_working_directory();

        outcome.map_err(|error| {
            error.log();
            warn!(
                repository = %repo.display_name(),
                step = ?error.step(),
                "Skipping repository after failure"
            );
            BatchFailure {
                remote_url: repo.remote_url.clone(),
                step: error.step().map(str::to_string),
                kind: error.kind(),
                message: error.to_string(),
            }
        })
    }

    /// Nothing in the pipeline changes the process directory, but a unit of
    /// work must never leak one into the next.
    fn restore_working_directory(&self) {
        let Some(origin) = &self.origin_dir else {
            return;
        };
        match std::env::current_dir() {
            Ok(current) if &current == origin => {}
            _ => {
                warn!(origin = %origin.display(), "Working directory changed, restoring");
                if let Err(e) = std::env::set_current_dir(origin) {
                    warn!(error = %e, "Could not restore working directory");
                }
            }
        }
    }
}
