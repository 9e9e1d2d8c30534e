//! Core orchestration layer for weaseltree
//!
//! This crate keeps a slow-mount checkout (the primary location) and its
//! fast-filesystem linked worktree (the mirror location) consistent:
//!
//! - **Identity resolution**: map a working directory to a repository identity and side
//! - **Link registry**: the durable record of which locations belong together
//! - **Drift detection**: classify how the two locations currently relate
//! - **Reconciler**: clone, sync, up, push, pull and status
//! - **Settings**: layered defaults, config file, environment and flags
//!
//! # Architecture
//!
//! `weasel-core` sits above the Layer 0 crates and below the CLI:
//!
//! ```text
//!        weasel-cli
//!            |
//!       weasel-core
//!            |
//!     +------+------+
//!     |             |
//! weasel-fs    weasel-git
//! ```
//!
//! # Example
//!
//! ```ignore
//! use weasel_core::{IdentityResolver, LinkRegistry, Reconciler, SettingsResolver};
//!
//! let settings = SettingsResolver::new().resolve(Default::default())?;
//! let mut registry = LinkRegistry::load(&settings.registry_path)?;
//! let resolver = IdentityResolver::from_settings(&settings)?;
//! let invocation = resolver.resolve(&std::env::current_dir()?, &registry)?;
//! let vcs = weasel_core::vcs_for(&settings);
//! let report = Reconciler::new(&mut registry, &vcs, &resolver, &settings).sync(&invocation)?;
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod reconcile;
pub mod registry;

pub use config::{Settings, SettingsOverrides, SettingsResolver};
pub use error::{Error, Result};
pub use identity::{IdentityResolver, Invocation};
pub use reconcile::{
    CloneOptions, Drift, DriftDetector, DriftReport, LinkState, Operation, OperationReport,
    Reconciler, StatusReport,
};
pub use registry::{LinkRecord, LinkRegistry};

use weasel_git::{BridgeGit, NativeGit, Vcs};

/// The execution contexts configured by `settings`.
pub fn vcs_for(settings: &Settings) -> Vcs {
    Vcs::new(
        Box::new(NativeGit::new()),
        Box::new(BridgeGit::new(settings.bridge_git.clone())),
    )
}
