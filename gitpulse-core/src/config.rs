//! Configuration management

use crate::error::{GitPulseError, GitPulseResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitPulseConfig {
    pub workspace: WorkspaceConfig,
    pub batch: BatchConfig,
    pub git: GitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root for working copies, relative paths resolve against the process cwd
    pub root_dir: PathBuf,
    /// Where JSON reports are written
    pub results_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("temp"),
            results_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// One repository at a time, in input order
    Sequential,
    /// Consecutive chunks of `concurrency` repositories, chunk after chunk
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub mode: BatchMode,
    pub concurrency: usize,
    /// Upper bound on in-flight per-author queries inside one repository
    pub author_query_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::Parallel,
            concurrency: 3,
            author_query_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub binary: String,
    /// Per-command timeout; `None` waits indefinitely
    pub command_timeout_secs: Option<u64>,
    /// Shallow clone depth; `None` clones full history
    pub clone_depth: Option<u32>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            command_timeout_secs: None,
            clone_depth: None,
        }
    }
}

impl GitConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

impl GitPulseConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GitPulseResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GitPulseError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GitPulseConfig = toml::from_str(&content).map_err(|e| GitPulseError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GitPulseResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| GitPulseError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| GitPulseError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> GitPulseResult<()> {
        if self.batch.concurrency == 0 {
            return Err(crate::config_error!(
                "batch.concurrency must be at least 1",
                "config"
            ));
        }

        if self.batch.author_query_concurrency == 0 {
            return Err(crate::config_error!(
                "batch.author_query_concurrency must be at least 1",
                "config"
            ));
        }

        if self.git.binary.trim().is_empty() {
            return Err(crate::config_error!("git.binary must not be empty", "config"));
        }

        if self.git.command_timeout_secs == Some(0) {
            return Err(crate::config_error!(
                "git.command_timeout_secs must be greater than 0 when set",
                "config"
            ));
        }

        if self.git.clone_depth == Some(0) {
            return Err(crate::config_error!(
                "git.clone_depth must be greater than 0 when set",
                "config"
            ));
        }

        Ok(())
    }
}
