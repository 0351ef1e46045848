//! End-to-end single repository analysis against a scripted git

mod common;

use common::{fail, healthy_history, ok, MockGit};
use gitpulse_core::{ErrorKind, GitExecutor, GitPulseConfig};
use gitpulse_repo::{repository_ref, RepositoryAnalyzer};
use std::sync::Arc;

const REMOTE: &str = "https://github.com/acme/widget";

fn analyzer(mock: &Arc<MockGit>) -> RepositoryAnalyzer {
    let git: Arc<dyn GitExecutor> = mock.clone();
    RepositoryAnalyzer::new(git, &GitPulseConfig::default())
}

#[tokio::test]
async fn test_full_analysis() {
    common::init_logging();
    let root = tempfile::tempdir().unwrap();
    let repo = repository_ref(REMOTE, root.path()).unwrap();
    let mock = MockGit::new(healthy_history);

    let result = analyzer(&mock).analyze(&repo).await.unwrap();

    assert_eq!(result.summary.total_commits, 12);
    assert_eq!(result.summary.total_contributors, 2);
    assert_eq!(result.summary.last_commit_date, "2024-03-28");
    assert_eq!(result.summary.first_commit_date, "2024-03-17");
    assert_eq!(result.recent_commits.len(), 10);
    assert_eq!(result.recent_commits[0].date, "2024-03-28");
    assert_eq!(result.repository_path, repo.local_path.display().to_string());
    assert_eq!(result.remote_url, REMOTE);

    let jane = &result.contributors[0];
    assert_eq!(jane.name, "Jane Doe");
    assert_eq!(jane.email, "jane@example.com");
    assert_eq!(jane.commit_count, 3);
    assert_eq!(jane.additions, 8);
    assert_eq!(jane.deletions, 3);
    assert_eq!(jane.first_commit_date, "2024-03-02");
    assert_eq!(jane.last_commit_date, "2024-03-27");

    let bob = &result.contributors[1];
    assert_eq!(bob.commit_count, 1);
    assert_eq!(bob.additions, 40);
    assert_eq!(bob.deletions, 0);
    assert_eq!(bob.first_commit_date, "2024-03-17");
    assert_eq!(bob.last_commit_date, "2024-03-17");

    assert!(repo.local_path.exists(), "working copy is kept as a cache");
}

#[tokio::test]
async fn test_per_author_queries_use_exact_email_filter_on_mailmapped_identities() {
    let root = tempfile::tempdir().unwrap();
    let repo = repository_ref(REMOTE, root.path()).unwrap();
    let mock = MockGit::new(healthy_history);

    analyzer(&mock).analyze(&repo).await.unwrap();

    let calls = mock.calls();
    for email in ["jane@example.com", "bob@example.com"] {
        let filter = format!("--author=<{}>", email);
        let per_author: Vec<_> = calls.iter().filter(|c| c.has(&filter)).collect();
        assert_eq!(per_author.len(), 2, "dates and shortstat for {}", email);
        assert!(per_author.iter().all(|c| c.has("--fixed-strings") && c.has("--all")));
        // shortlog applies .mailmap, so the per-author logs must as well
        assert!(per_author.iter().all(|c| c.has("--use-mailmap")));
    }
    assert!(calls
        .iter()
        .filter(|c| c.subcommand() != "clone")
        .all(|c| c.repo.as_deref() == Some(repo.local_path.as_path())));
}

#[tokio::test]
async fn test_empty_repository() {
    let root = tempfile::tempdir().unwrap();
    let repo = repository_ref(REMOTE, root.path()).unwrap();
    let mock = MockGit::new(|call| match call.subcommand() {
        "clone" | "shortlog" => ok(""),
        "log" => fail("fatal: your current branch 'main' does not have any commits yet"),
        other => fail(&format!("unexpected git {}", other)),
    });

    let result = analyzer(&mock).analyze(&repo).await.unwrap();

    assert_eq!(result.summary.total_commits, 0);
    assert_eq!(result.summary.total_contributors, 0);
    assert_eq!(result.summary.first_commit_date, "");
    assert_eq!(result.summary.last_commit_date, "");
    assert!(result.contributors.is_empty());
    assert!(result.recent_commits.is_empty());
}

#[tokio::test]
async fn test_failed_query_removes_working_copy() {
    let root = tempfile::tempdir().unwrap();
    let repo = repository_ref(REMOTE, root.path()).unwrap();
    let mock = MockGit::new(|call| match call.subcommand() {
        "shortlog" => fail("fatal: bad object HEAD"),
        _ => healthy_history(call),
    });

    let err = analyzer(&mock).analyze(&repo).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueryFailed);
    assert_eq!(err.step(), Some("author_listing"));
    assert!(err.to_string().contains("bad object HEAD"));
    assert!(!repo.local_path.exists());
}

#[tokio::test]
async fn test_failed_author_query_fails_the_repository() {
    let root = tempfile::tempdir().unwrap();
    let repo = repository_ref(REMOTE, root.path()).unwrap();
    let mock = MockGit::new(|call| {
        if call.has("--shortstat") && call.mentions("<bob@example.com>") {
            fail("fatal: out of memory")
        } else {
            healthy_history(call)
        }
    });

    let err = analyzer(&mock).analyze(&repo).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueryFailed);
    assert_eq!(err.step(), Some("author_shortstat"));
    assert!(!repo.local_path.exists());
}

#[tokio::test]
async fn test_failed_clone_leaves_nothing_behind() {
    let root = tempfile::tempdir().unwrap();
    let repo = repository_ref(REMOTE, root.path()).unwrap();
    let mock = MockGit::new(|_| fail("fatal: could not resolve host"));

    let err = analyzer(&mock).analyze(&repo).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CloneFailed);
    assert!(!repo.local_path.exists());
    assert_eq!(mock.subcommands(), vec!["clone"]);
}
