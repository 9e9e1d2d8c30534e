//! Error types for weasel-core
//!
//! Every failure a user can see falls into one of a few categories; the CLI
//! prints [`Error::category`] in front of the message.

use std::path::PathBuf;

/// Result type for weasel-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weasel-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The working directory is not inside a recognized location
    #[error("{path} is not inside a recognized primary or mirror location")]
    Identity { path: PathBuf },

    /// No link is recorded for the identity
    #[error("no link recorded for '{identity}'; run `weaseltree clone` from the primary location")]
    NotFound { identity: String },

    /// A required condition does not hold; nothing was changed
    #[error("{0}")]
    Precondition(String),

    /// Histories have diverged and a fast-forward is impossible
    #[error("{0}")]
    Diverged(String),

    /// A git operation failed
    #[error(transparent)]
    Vcs(weasel_git::Error),

    /// A required external tool or host facility is missing
    #[error("{0}")]
    Environment(String),

    /// Invalid settings or registry content
    #[error("{0}")]
    Config(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from weasel-fs
    #[error(transparent)]
    Fs(#[from] weasel_fs::Error),

    /// Standard I/O error
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Category name shown to users.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Identity { .. } => "IdentityError",
            Error::NotFound { .. } => "NotFound",
            Error::Precondition(_) => "PreconditionError",
            Error::Diverged(_) => "DivergedError",
            Error::Vcs(_) => "VcsError",
            Error::Environment(_) => "EnvironmentError",
            Error::Config(_) => "ConfigError",
            Error::Fs(weasel_fs::Error::ConfigParse { .. })
            | Error::Fs(weasel_fs::Error::ConfigSerialize { .. }) => "ConfigError",
            Error::Fs(_) | Error::Io { .. } => "FilesystemError",
        }
    }
}

impl From<weasel_git::Error> for Error {
    fn from(err: weasel_git::Error) -> Self {
        use weasel_git::Error as Git;
        match err {
            Git::Diverged { .. } => Error::Diverged(err.to_string()),
            Git::ToolUnavailable { .. } => Error::Environment(err.to_string()),
            Git::Dirty { .. }
            | Git::DetachedHead { .. }
            | Git::TargetNotEmpty { .. }
            | Git::WrongBranch { .. } => Error::Precondition(err.to_string()),
            other => Error::Vcs(other),
        }
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Vcs(weasel_git::Error::Git(err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Config(format!("invalid primary pattern: {err}"))
    }
}
