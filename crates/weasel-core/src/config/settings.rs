//! Settings resolution with layered overrides
//!
//! The `SettingsResolver` merges settings from several sources, later ones
//! winning:
//! 1. Built-in defaults
//! 2. User config file (`<config_dir>/weaseltree/config.toml`)
//! 3. Environment variables (`WEASELTREE_*`)
//! 4. Command-line flags ([`SettingsOverrides`])

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use weasel_fs::{ConfigStore, NormalizedPath};
use weasel_git::DEFAULT_BRIDGE_PROGRAM;

use super::environment;
use crate::{Error, Result};

/// Registry file name placed in the host home directory.
pub const REGISTRY_FILE_NAME: &str = ".weaseltree.toml";

pub const ENV_REGISTRY: &str = "WEASELTREE_REGISTRY";
pub const ENV_BRIDGE_GIT: &str = "WEASELTREE_BRIDGE_GIT";
pub const ENV_MIRROR_ROOT: &str = "WEASELTREE_MIRROR_ROOT";
pub const ENV_REMOTE: &str = "WEASELTREE_REMOTE";

/// Patterns recognizing a slow-side checkout; the capture is the identity.
pub fn default_primary_patterns() -> Vec<String> {
    vec![
        r"^/mnt/[a-zA-Z]/(.+)$".to_string(),
        r"^[a-zA-Z]:[/\\](.+)$".to_string(),
    ]
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Link registry file
    pub registry_path: PathBuf,
    /// Directory under which mirrors are created by default
    pub mirror_root: PathBuf,
    /// Git binary used for the slow side
    pub bridge_git: String,
    /// Remote used by push and pull
    pub remote: String,
    /// Regexes with one capture group mapping a primary path to its identity
    pub primary_patterns: Vec<String>,
}

/// Optional settings as they appear in the user config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub registry_path: Option<PathBuf>,
    pub mirror_root: Option<PathBuf>,
    pub bridge_git: Option<String>,
    pub remote: Option<String>,
    pub primary_patterns: Option<Vec<String>>,
}

impl SettingsFile {
    /// Overlay `other` on top of `self`.
    fn merge(&mut self, other: SettingsFile) {
        if other.registry_path.is_some() {
            self.registry_path = other.registry_path;
        }
        if other.mirror_root.is_some() {
            self.mirror_root = other.mirror_root;
        }
        if other.bridge_git.is_some() {
            self.bridge_git = other.bridge_git;
        }
        if other.remote.is_some() {
            self.remote = other.remote;
        }
        if other.primary_patterns.is_some() {
            self.primary_patterns = other.primary_patterns;
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub registry_path: Option<PathBuf>,
    pub mirror_root: Option<PathBuf>,
    pub bridge_git: Option<String>,
    pub remote: Option<String>,
}

impl From<SettingsOverrides> for SettingsFile {
    fn from(o: SettingsOverrides) -> Self {
        Self {
            registry_path: o.registry_path,
            mirror_root: o.mirror_root,
            bridge_git: o.bridge_git,
            remote: o.remote,
            primary_patterns: None,
        }
    }
}

/// Resolves [`Settings`] by merging all sources.
#[derive(Debug, Default)]
pub struct SettingsResolver {
    /// Override for the user config directory (used for testing).
    /// When `None`, the platform directory from `dirs::config_dir()` is used.
    config_dir_override: Option<PathBuf>,

    /// Replacement for the process environment (used for testing).
    env_override: Option<HashMap<String, String>>,

    /// Replacement for the detected host home (used for testing).
    home_override: Option<PathBuf>,
}

impl SettingsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `dir` instead of `<config_dir>/weaseltree`.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir_override = Some(dir.into());
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_override = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Use `home` instead of probing the host.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_override = Some(home.into());
        self
    }

    fn config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join("weaseltree"))
    }

    fn var(&self, key: &str) -> Option<String> {
        let value = match &self.env_override {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        value.filter(|v| !v.is_empty())
    }

    fn env_layer(&self) -> SettingsFile {
        SettingsFile {
            registry_path: self.var(ENV_REGISTRY).map(PathBuf::from),
            mirror_root: self.var(ENV_MIRROR_ROOT).map(PathBuf::from),
            bridge_git: self.var(ENV_BRIDGE_GIT),
            remote: self.var(ENV_REMOTE),
            primary_patterns: None,
        }
    }

    fn file_layer(&self) -> Result<SettingsFile> {
        let Some(dir) = self.config_dir() else {
            return Ok(SettingsFile::default());
        };
        let path = NormalizedPath::new(dir.join("config.toml"));
        match ConfigStore::new().load_optional::<SettingsFile>(&path)? {
            Some(file) => {
                tracing::debug!(path = %path, "loaded user settings");
                Ok(file)
            }
            None => {
                tracing::debug!(path = %path, "no user settings file, skipping");
                Ok(SettingsFile::default())
            }
        }
    }

    /// Resolve the effective settings.
    ///
    /// The host home is only looked up when the registry path or mirror root is
    /// not given by any layer.
    pub fn resolve(&self, overrides: SettingsOverrides) -> Result<Settings> {
        let mut merged = self.file_layer()?;
        merged.merge(self.env_layer());
        merged.merge(overrides.into());

        let registry_path = match merged.registry_path {
            Some(path) => path,
            None => self.host_home()?.join(REGISTRY_FILE_NAME),
        };
        let mirror_root = match merged.mirror_root {
            Some(path) => path,
            None => self.local_home()?,
        };

        Ok(Settings {
            registry_path,
            mirror_root,
            bridge_git: merged
                .bridge_git
                .unwrap_or_else(|| DEFAULT_BRIDGE_PROGRAM.to_string()),
            remote: merged.remote.unwrap_or_else(|| "origin".to_string()),
            primary_patterns: merged
                .primary_patterns
                .unwrap_or_else(default_primary_patterns),
        })
    }

    fn host_home(&self) -> Result<PathBuf> {
        if let Some(ref home) = self.home_override {
            return Ok(home.clone());
        }
        environment::host_home()
            .ok_or_else(|| Error::Environment("cannot determine the home directory".into()))
    }

    fn local_home(&self) -> Result<PathBuf> {
        if let Some(ref home) = self.home_override {
            return Ok(home.clone());
        }
        dirs::home_dir()
            .ok_or_else(|| Error::Environment("cannot determine the home directory".into()))
    }
}
