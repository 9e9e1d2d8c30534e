//! Error types for weasel-fs

use std::path::PathBuf;

/// Result type for weasel-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weasel-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "invalid TOML in {path}{}: {message}",
        .line.map(|l| format!(" at line {l}")).unwrap_or_default()
    )]
    ConfigParse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("cannot encode {path} as TOML: {message}")]
    ConfigSerialize { path: PathBuf, message: String },

    #[error("Refusing unsafe relative path '{path}': {reason}")]
    UnsafePath { path: String, reason: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
