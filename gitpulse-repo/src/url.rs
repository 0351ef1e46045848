//! Remote URL parsing and normalization

use gitpulse_core::{ErrorContext, GitPulseError, GitPulseResult, RepositoryRef};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static HTTPS_PATTERN: OnceLock<Regex> = OnceLock::new();
static SSH_PATTERN: OnceLock<Regex> = OnceLock::new();
static SCP_PATTERN: OnceLock<Regex> = OnceLock::new();
static SSH_SCHEME_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Owner and repository identifiers extracted from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteId {
    pub owner: String,
    pub repo: String,
}

fn https_pattern() -> &'static Regex {
    HTTPS_PATTERN.get_or_init(|| {
        Regex::new(r"/([^/]+)/([^/]+?)(?:\.git)?/?$").expect("valid https pattern")
    })
}

fn ssh_pattern() -> &'static Regex {
    SSH_PATTERN.get_or_init(|| {
        Regex::new(r"[:/]([^/:]+)/([^/]+?)(?:\.git)?/?$").expect("valid ssh pattern")
    })
}

/// Extract `{owner, repo}` from an HTTPS or SSH style remote URL.
///
/// The HTTPS form (`.../owner/repo[.git]`) is tried first, then the SSH form
/// (`...[:/]owner/repo[.git]`). A trailing `.git` is never part of `repo`.
pub fn parse_remote_url(url: &str) -> GitPulseResult<RemoteId> {
    let trimmed = url.trim();

    let captures = https_pattern()
        .captures(trimmed)
        .or_else(|| ssh_pattern().captures(trimmed))
        .ok_or_else(|| invalid_url(url))?;

    let owner = captures[1].to_string();
    let repo = captures[2].to_string();

    if !is_directory_segment(&owner) || !is_directory_segment(&repo) {
        return Err(invalid_url(url));
    }

    Ok(RemoteId { owner, repo })
}

/// Build the immutable reference for `url` with its working copy under `root`
pub fn repository_ref(url: &str, root: &Path) -> GitPulseResult<RepositoryRef> {
    let id = parse_remote_url(url)?;
    Ok(RepositoryRef::new(&id.owner, &id.repo, url.trim(), root))
}

/// Canonical form used to compare remote URLs.
///
/// Trims whitespace and trailing slashes, strips `.git`, and rewrites
/// `[user@]host:owner/repo` and `ssh://[user@]host/owner/repo` to
/// `https://host/owner/repo`.
pub fn normalize_remote_url(url: &str) -> String {
    let mut normalized = url.trim().trim_end_matches('/');
    if let Some(stripped) = normalized.strip_suffix(".git") {
        normalized = stripped;
    }

    let scp = SCP_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[^@/:]+@)?([^:/]+):([^/].*)$").expect("valid scp pattern")
    });
    let ssh_scheme = SSH_SCHEME_PATTERN.get_or_init(|| {
        Regex::new(r"^ssh://(?:[^@/]+@)?([^/:]+)(?::\d+)?/(.+)$").expect("valid ssh scheme pattern")
    });

    if !normalized.contains("://") {
        if let Some(captures) = scp.captures(normalized) {
            return format!("https://{}/{}", &captures[1], &captures[2]);
        }
    }

    if let Some(captures) = ssh_scheme.captures(normalized) {
        return format!("https://{}/{}", &captures[1], &captures[2]);
    }

    normalized.to_string()
}

/// Whether two remote URLs point at the same repository after normalization
pub fn remotes_match(left: &str, right: &str) -> bool {
    normalize_remote_url(left) == normalize_remote_url(right)
}

/// Ids become `<root>/<owner>/<repo>`; each must name its own directory
fn is_directory_segment(id: &str) -> bool {
    !id.is_empty() && !matches!(id, "." | ".." | ".git")
}

fn invalid_url(url: &str) -> GitPulseError {
    GitPulseError::InvalidUrl {
        url: url.to_string(),
        context: ErrorContext::new("url_parser")
            .with_operation("parse_remote_url")
            .with_suggestion("Use https://host/owner/repo(.git) or git@host:owner/repo(.git)"),
    }
}
