//! Settings and host environment
//!
//! - [`SettingsResolver`] merges defaults, the user config file, environment
//!   variables and command-line overrides into [`Settings`]
//! - [`environment`] finds the home directory shared with the slow side

pub mod environment;
mod settings;

pub use settings::{
    ENV_BRIDGE_GIT, ENV_MIRROR_ROOT, ENV_REGISTRY, ENV_REMOTE, REGISTRY_FILE_NAME, Settings,
    SettingsFile, SettingsOverrides, SettingsResolver, default_primary_patterns,
};
