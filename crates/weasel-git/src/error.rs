//! Error types for weasel-git

use std::path::PathBuf;

/// Result type for weasel-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weasel-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] weasel_fs::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured git binary could not be started at all.
    #[error("'{program}' is not available: {reason}")]
    ToolUnavailable { program: String, reason: String },

    /// The git binary ran and reported failure; stderr is passed through.
    #[error("`{program} {args}` failed in {location}: {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        location: PathBuf,
        stderr: String,
    },

    #[error("{location} has uncommitted changes ({count} path(s)); commit or discard them first")]
    Dirty { location: PathBuf, count: usize },

    #[error("{location} is on a detached HEAD")]
    DetachedHead { location: PathBuf },

    #[error("Cannot fast-forward '{branch}' at {location}: local {local} is not an ancestor of {upstream}")]
    Diverged {
        branch: String,
        location: PathBuf,
        local: String,
        upstream: String,
    },

    #[error("{location} is on '{actual}', expected '{expected}'")]
    WrongBranch {
        location: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Worktree target {path} already exists and is not empty")]
    TargetNotEmpty { path: PathBuf },

    #[error("Branch '{name}' not found")]
    BranchNotFound { name: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Push of '{branch}' to '{remote}' rejected: {message}")]
    PushFailed {
        remote: String,
        branch: String,
        message: String,
    },

    #[error("Unexpected output from {program}: {message}")]
    Parse { program: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
