//! Error types for weasel-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from weasel-core
    #[error(transparent)]
    Core(#[from] weasel_core::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure to render machine-readable output
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Category name printed before the message.
    pub fn category(&self) -> &'static str {
        match self {
            CliError::Core(e) => e.category(),
            CliError::Io(_) => "FilesystemError",
            CliError::Json(_) => "ConfigError",
        }
    }
}
