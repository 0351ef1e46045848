//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type GitPulseResult<T> = Result<T, GitPulseError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Step being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Flat classification of [`GitPulseError`], used for reporting and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    ToolMissing,
    CloneFailed,
    FetchFailed,
    UnresolvableBranch,
    ResetFailed,
    CleanFailed,
    QueryFailed,
    Timeout,
    Config,
    Io,
    Serialization,
    Internal,
}

/// Main error type for the GitPulse system
#[derive(Error, Debug)]
pub enum GitPulseError {
    #[error("Invalid repository URL '{url}': expected https://host/owner/repo or git@host:owner/repo")]
    InvalidUrl { url: String, context: ErrorContext },

    #[error("Version control tool '{binary}' is not available: {message}")]
    ToolMissing {
        binary: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Clone of {repository} failed: {message}")]
    CloneFailed {
        repository: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Fetch for {repository} failed: {message}")]
    FetchFailed {
        repository: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Could not resolve a valid default branch for {repository}")]
    UnresolvableBranch {
        repository: String,
        context: ErrorContext,
    },

    #[error("Reset of {repository} to origin/{branch} failed: {message}")]
    ResetFailed {
        repository: String,
        branch: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Cleaning untracked files in {repository} failed: {message}")]
    CleanFailed {
        repository: String,
        message: String,
        context: ErrorContext,
    },

    #[error("History query '{command}' for {repository} failed: {message}")]
    QueryFailed {
        repository: String,
        command: String,
        message: String,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl GitPulseError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GitPulseError::InvalidUrl { context, .. } => Some(context),
            GitPulseError::ToolMissing { context, .. } => Some(context),
            GitPulseError::CloneFailed { context, .. } => Some(context),
            GitPulseError::FetchFailed { context, .. } => Some(context),
            GitPulseError::UnresolvableBranch { context, .. } => Some(context),
            GitPulseError::ResetFailed { context, .. } => Some(context),
            GitPulseError::CleanFailed { context, .. } => Some(context),
            GitPulseError::QueryFailed { context, .. } => Some(context),
            GitPulseError::Timeout { context, .. } => Some(context),
            GitPulseError::Config { context, .. } => Some(context),
            GitPulseError::Internal { context, .. } => Some(context),
            GitPulseError::Io(_) | GitPulseError::Serialization(_) => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GitPulseError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            GitPulseError::ToolMissing { .. } => ErrorKind::ToolMissing,
            GitPulseError::CloneFailed { .. } => ErrorKind::CloneFailed,
            GitPulseError::FetchFailed { .. } => ErrorKind::FetchFailed,
            GitPulseError::UnresolvableBranch { .. } => ErrorKind::UnresolvableBranch,
            GitPulseError::ResetFailed { .. } => ErrorKind::ResetFailed,
            GitPulseError::CleanFailed { .. } => ErrorKind::CleanFailed,
            GitPulseError::QueryFailed { .. } => ErrorKind::QueryFailed,
            GitPulseError::Timeout { .. } => ErrorKind::Timeout,
            GitPulseError::Config { .. } => ErrorKind::Config,
            GitPulseError::Io(_) => ErrorKind::Io,
            GitPulseError::Serialization(_) => ErrorKind::Serialization,
            GitPulseError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// The step that was running when the error occurred, if recorded
    pub fn step(&self) -> Option<&str> {
        self.context().and_then(|c| c.operation.as_deref())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            GitPulseError::Internal { .. } | GitPulseError::ToolMissing { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            GitPulseError::Config { .. } | GitPulseError::InvalidUrl { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or input error"
                );
            }
            GitPulseError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Git command timed out"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    step = ?self.step(),
                    error = %self,
                    "Repository step failed"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GitPulseError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_operation("validate")
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'gitpulse config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr, $component:expr) => {
        $crate::GitPulseError::Internal {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::GitPulseError::Internal {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}
