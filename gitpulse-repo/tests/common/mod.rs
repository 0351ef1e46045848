//! Common test utilities
//!
//! A scripted in-memory git that records every invocation, so repository
//! workflows can be tested without a network or a git binary.

#![allow(dead_code)]

use gitpulse_core::{async_trait, CommandOutput, GitExecutor, GitPulseResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("gitpulse_repo=debug")
            .with_test_writer()
            .try_init();
    });
}

/// One recorded call
#[derive(Debug, Clone)]
pub struct Invocation {
    pub repo: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    pub fn has(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a.contains(needle))
    }
}

type Handler = dyn Fn(&Invocation) -> CommandOutput + Send + Sync;

pub struct MockGit {
    handler: Box<Handler>,
    calls: Mutex<Vec<Invocation>>,
    clone_delay: Option<Duration>,
    clones_in_flight: AtomicUsize,
    max_clones_in_flight: AtomicUsize,
}

impl MockGit {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Invocation) -> CommandOutput + Send + Sync + 'static,
    {
        Self::with_clone_delay(handler, None)
    }

    /// Clones sleep for `delay`, which lets tests observe how many overlap
    pub fn with_clone_delay<F>(handler: F, delay: Option<Duration>) -> Arc<Self>
    where
        F: Fn(&Invocation) -> CommandOutput + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            clone_delay: delay,
            clones_in_flight: AtomicUsize::new(0),
            max_clones_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.subcommand().to_string())
            .collect()
    }

    pub fn max_clones_in_flight(&self) -> usize {
        self.max_clones_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GitExecutor for MockGit {
    async fn run(&self, repo: Option<&Path>, args: &[&str]) -> GitPulseResult<CommandOutput> {
        let invocation = Invocation {
            repo: repo.map(Path::to_path_buf),
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        self.calls.lock().unwrap().push(invocation.clone());

        let is_clone = invocation.subcommand() == "clone";
        if is_clone {
            let now = self.clones_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_clones_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.clone_delay {
                tokio::time::sleep(delay).await;
            }
        }

        let output = (self.handler)(&invocation);

        if is_clone {
            if output.success() {
                // Like git, leave a working copy with metadata behind
                let target = PathBuf::from(clone_target(&invocation));
                std::fs::create_dir_all(target.join(".git")).unwrap();
            }
            self.clones_in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        Ok(output)
    }
}

/// `clone [options] -- <url> <path>`: the path is the second argument after `--`
fn clone_target(invocation: &Invocation) -> &str {
    let separator = invocation
        .args
        .iter()
        .position(|a| a == "--")
        .expect("clone passes -- before the url");
    assert_eq!(
        invocation.args.len(),
        separator + 3,
        "clone takes exactly a url and a path after --: {:?}",
        invocation.args
    );
    &invocation.args[separator + 2]
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        status: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn fail(stderr: &str) -> CommandOutput {
    CommandOutput {
        status: Some(128),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub const AUTHOR_LISTING: &str =
    "     3\tJane Doe <jane@example.com>\n     1\tBob <bob@example.com>\n";

/// `count` commits, newest first, dated backwards from 2024-03-28
pub fn commit_log(count: usize) -> String {
    (0..count)
        .map(|i| {
            format!(
                "{:07x}\u{1f}{}\u{1f}2024-03-{:02}\u{1f}Change number {}",
                count - i,
                if i % 4 == 0 { "Bob" } else { "Jane Doe" },
                28 - i,
                count - i
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Answers every history query of a small, healthy repository with 12 commits
pub fn healthy_history(invocation: &Invocation) -> CommandOutput {
    match invocation.subcommand() {
        "clone" => ok(""),
        "shortlog" => ok(AUTHOR_LISTING),
        "log" if invocation.has("--shortstat") => {
            if invocation.mentions("<jane@example.com>") {
                ok("\n 1 file changed, 3 insertions(+), 1 deletion(-)\n\n 2 files changed, 5 insertions(+)\n\n 1 file changed, 2 deletions(-)\n")
            } else {
                ok("\n 4 files changed, 40 insertions(+)\n")
            }
        }
        "log" if invocation.has("--reverse") => {
            if invocation.mentions("<jane@example.com>") {
                ok("2024-03-02\n2024-03-10\n2024-03-27")
            } else {
                ok("2024-03-17")
            }
        }
        "log" => ok(&commit_log(12)),
        other => fail(&format!("unexpected git {}", other)),
    }
}
