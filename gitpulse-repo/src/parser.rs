//! Stats parser
//!
//! Turns git's textual output into structured records. All grammar rules for
//! the version-control output live here; nothing in this module runs commands.

use gitpulse_core::CommitRecord;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Separator between fields of one commit-log line (ASCII unit separator)
pub const LOG_FIELD_DELIMITER: char = '\u{1f}';

static AUTHOR_LINE: OnceLock<Regex> = OnceLock::new();
static INSERTIONS: OnceLock<Regex> = OnceLock::new();
static DELETIONS: OnceLock<Regex> = OnceLock::new();
static BRANCH_NAME: OnceLock<Regex> = OnceLock::new();

/// One row of the aggregate author listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCount {
    pub name: String,
    pub email: String,
    pub commit_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineChanges {
    pub additions: u64,
    pub deletions: u64,
}

/// Parse `shortlog -sne` output. Lines that do not match are skipped.
pub fn parse_author_listing(text: &str) -> Vec<AuthorCount> {
    let pattern = AUTHOR_LINE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s+(.+?)\s+<([^>]*)>\s*$").expect("valid author pattern")
    });

    text.lines()
        .filter_map(|line| {
            let captures = pattern.captures(line)?;
            let commit_count = captures[1].parse().ok()?;
            Some(AuthorCount {
                name: captures[2].to_string(),
                email: captures[3].to_string(),
                commit_count,
            })
        })
        .collect()
}

/// Collapse rows sharing an email into one, summing their counts.
///
/// The first row seen for an email supplies the name; first-seen order is kept.
pub fn merge_authors_by_email(authors: Vec<AuthorCount>) -> Vec<AuthorCount> {
    let mut merged: Vec<AuthorCount> = Vec::with_capacity(authors.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for author in authors {
        match index.get(&author.email) {
            Some(&position) => merged[position].commit_count += author.commit_count,
            None => {
                index.insert(author.email.clone(), merged.len());
                merged.push(author);
            }
        }
    }

    merged
}

/// Split one log line into hash, author, date and message.
///
/// Missing trailing fields are left empty; this never fails.
pub fn parse_commit_line(line: &str) -> CommitRecord {
    let mut fields = line
        .trim_end_matches('\r')
        .splitn(4, LOG_FIELD_DELIMITER)
        .map(str::to_string);

    CommitRecord {
        hash: fields.next().unwrap_or_default(),
        author: fields.next().unwrap_or_default(),
        date: fields.next().unwrap_or_default(),
        message: fields.next().unwrap_or_default(),
    }
}

/// One record per output line, in the order git printed them (newest first)
pub fn parse_commit_log(text: &str) -> Vec<CommitRecord> {
    let text = text.trim_end_matches(|c| c == '\n' || c == '\r');
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(parse_commit_line).collect()
}

/// Sum every `<n> insertion(s)` and `<n> deletion(s)` in a shortstat blob
pub fn parse_shortstat(blob: &str) -> LineChanges {
    let insertions = INSERTIONS
        .get_or_init(|| Regex::new(r"(\d+) insertions?").expect("valid insertion pattern"));
    let deletions =
        DELETIONS.get_or_init(|| Regex::new(r"(\d+) deletions?").expect("valid deletion pattern"));

    LineChanges {
        additions: sum_captures(insertions, blob),
        deletions: sum_captures(deletions, blob),
    }
}

fn sum_captures(pattern: &Regex, blob: &str) -> u64 {
    pattern
        .captures_iter(blob)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .fold(0u64, |total, n| total.saturating_add(n))
}

/// First and last entries of a chronological date list, empty strings when there are none
pub fn first_and_last_dates(text: &str) -> (String, String) {
    let mut dates = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = dates.next().unwrap_or_default().to_string();
    let last = dates.last().map(str::to_string).unwrap_or_else(|| first.clone());
    (first, last)
}

/// Branch names allowed into later git arguments
pub fn is_valid_branch_name(name: &str) -> bool {
    BRANCH_NAME
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid branch pattern"))
        .is_match(name)
}

/// Branch named by `ls-remote --symref origin HEAD`, e.g. `ref: refs/heads/main\tHEAD`
pub fn parse_remote_head(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let target = line.strip_prefix("ref:")?.trim();
        let (reference, name) = target.split_once(char::is_whitespace)?;
        if name.trim() != "HEAD" {
            return None;
        }
        reference
            .strip_prefix("refs/heads/")
            .map(str::to_string)
    })
}

/// Branch from `symbolic-ref --short refs/remotes/origin/HEAD`, e.g. `origin/main`
pub fn parse_symbolic_head(output: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    let branch = line.strip_prefix("origin/").unwrap_or(line);
    (!branch.is_empty()).then(|| branch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_listing() {
        let text = "   5  Jane Doe  <jane@example.com>\n   2  Bob <bob@example.com>\n";
        let authors = parse_author_listing(text);

        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].name, "Jane Doe");
        assert_eq!(authors[0].email, "jane@example.com");
        assert_eq!(authors[0].commit_count, 5);
        assert_eq!(authors[1].name, "Bob");
        assert_eq!(authors[1].commit_count, 2);
    }

    #[test]
    fn test_author_listing_skips_noise() {
        let text = "\n  garbage line\n    12\tAda Lovelace <ada@example.org>\nno count <x@y>\n\n";
        let authors = parse_author_listing(text);

        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].name, "Ada Lovelace");
        assert_eq!(authors[0].commit_count, 12);
    }

    #[test]
    fn test_merge_authors_by_email() {
        let authors = parse_author_listing(
            "  4\tJane Doe <jane@example.com>\n  3\tBob <bob@example.com>\n  1\tjane <jane@example.com>\n",
        );
        let merged = merge_authors_by_email(authors);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "Jane Doe");
        assert_eq!(merged[0].commit_count, 5);
        assert_eq!(merged[1].email, "bob@example.com");
    }

    #[test]
    fn test_commit_log() {
        let text = "abc123\u{1f}Jane\u{1f}2024-03-02\u{1f}Fix parser | edge case\n\
                    def456\u{1f}Bob\u{1f}2024-03-01\u{1f}Initial commit\n";
        let commits = parse_commit_log(text);

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "abc123");
        assert_eq!(commits[0].author, "Jane");
        assert_eq!(commits[0].date, "2024-03-02");
        assert_eq!(commits[0].message, "Fix parser | edge case");
        assert_eq!(commits[1].message, "Initial commit");
    }

    #[test]
    fn test_short_commit_line_keeps_alignment() {
        let commits = parse_commit_log("abc\u{1f}Jane\n\ndef\u{1f}Bob\u{1f}2024-01-01\u{1f}msg");

        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].hash, "abc");
        assert_eq!(commits[0].author, "Jane");
        assert_eq!(commits[0].date, "");
        assert_eq!(commits[0].message, "");
        assert_eq!(commits[1], CommitRecord::default());
        assert_eq!(commits[2].hash, "def");
    }

    #[test]
    fn test_message_may_contain_delimiter() {
        let record = parse_commit_line("h\u{1f}a\u{1f}d\u{1f}one\u{1f}two");
        assert_eq!(record.message, "one\u{1f}two");
    }

    #[test]
    fn test_empty_commit_log() {
        assert!(parse_commit_log("").is_empty());
        assert!(parse_commit_log("\n").is_empty());
    }

    #[test]
    fn test_shortstat() {
        let changes = parse_shortstat("1 file changed, 3 insertions(+), 1 deletion(-)");
        assert_eq!(changes.additions, 3);
        assert_eq!(changes.deletions, 1);

        let blob = "\n 2 files changed, 10 insertions(+), 4 deletions(-)\n\n 1 file changed, 1 insertion(+)\n\n 1 file changed, 7 deletions(-)\n";
        let changes = parse_shortstat(blob);
        assert_eq!(changes.additions, 11);
        assert_eq!(changes.deletions, 11);
    }

    #[test]
    fn test_shortstat_without_insertions_is_zero() {
        let changes = parse_shortstat(" 1 file changed, 2 deletions(-)");
        assert_eq!(changes.additions, 0);
        assert_eq!(changes.deletions, 2);
        assert_eq!(parse_shortstat(""), LineChanges::default());
    }

    #[test]
    fn test_first_and_last_dates() {
        assert_eq!(
            first_and_last_dates("2023-01-05\n2023-02-01\n2024-07-30\n"),
            ("2023-01-05".to_string(), "2024-07-30".to_string())
        );
        assert_eq!(
            first_and_last_dates("2023-01-05"),
            ("2023-01-05".to_string(), "2023-01-05".to_string())
        );
        assert_eq!(first_and_last_dates(""), (String::new(), String::new()));
    }

    #[test]
    fn test_branch_name_allow_list() {
        for name in ["main", "master", "release-1.2", "dev_branch", "v2.0"] {
            assert!(is_valid_branch_name(name), "{} should be accepted", name);
        }
        for name in ["", "feature/x", "main; rm -rf /", "$(whoami)", "a b", "main\n"] {
            assert!(!is_valid_branch_name(name), "{:?} should be rejected", name);
        }
    }

    #[test]
    fn test_parse_remote_head() {
        let output = "ref: refs/heads/trunk\tHEAD\n4a5b6c7d\tHEAD\n";
        assert_eq!(parse_remote_head(output), Some("trunk".to_string()));
        assert_eq!(parse_remote_head("4a5b6c7d\tHEAD\n"), None);
        assert_eq!(parse_remote_head(""), None);
    }

    #[test]
    fn test_parse_symbolic_head() {
        assert_eq!(parse_symbolic_head("origin/main\n"), Some("main".to_string()));
        assert_eq!(parse_symbolic_head(""), None);
    }
}
