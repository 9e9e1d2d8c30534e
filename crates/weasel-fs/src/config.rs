//! TOML state files
//!
//! The link registry and the user settings file are both single TOML
//! documents. Reads report the line a syntax error sits on; writes go
//! through [`io::write_atomic`] so a reader never sees half a registry.

use crate::{Error, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};

/// Reads and atomically rewrites one TOML document.
#[derive(Debug, Default)]
pub struct ConfigStore {
    robustness: io::RobustnessConfig,
    header: Option<&'static str>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_robustness(robustness: io::RobustnessConfig) -> Self {
        Self {
            robustness,
            header: None,
        }
    }

    /// Comment written above the document on every save, one `#` line per
    /// line of `header`.
    pub fn with_header(mut self, header: &'static str) -> Self {
        self.header = Some(header);
        self
    }

    /// Parse the TOML document at `path`, whatever its extension.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_native(),
            line: e.span().map(|span| line_of(&content, span.start)),
            message: e.message().trim().to_string(),
        })
    }

    /// Like [`load`](Self::load), with `None` for a file that is not there yet.
    pub fn load_optional<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<Option<T>> {
        if !path.is_file() {
            return Ok(None);
        }
        self.load(path).map(Some)
    }

    /// Replace the document at `path` with `value`.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let body = toml::to_string_pretty(value).map_err(|e| Error::ConfigSerialize {
            path: path.to_native(),
            message: e.to_string(),
        })?;

        let mut content = String::new();
        if let Some(header) = self.header {
            for line in header.lines() {
                content.push_str("# ");
                content.push_str(line);
                content.push('\n');
            }
            content.push('\n');
        }
        content.push_str(&body);

        io::write_atomic(path, content.as_bytes(), self.robustness)
    }
}

/// 1-based line containing byte `offset`.
fn line_of(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    content.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
