//! Git execution contexts for weaseltree
//!
//! The two linked locations are driven through different paths: the slow
//! side through an external git binary ([`BridgeGit`]) and the fast side
//! in-process through libgit2 ([`NativeGit`]). Both implement
//! [`GitContext`]; [`Vcs`] routes each step to the right one.

pub mod bridge;
pub mod changes;
pub mod commits;
pub mod error;
pub mod helpers;
pub mod native;
pub mod provider;

pub use bridge::{BridgeGit, DEFAULT_BRIDGE_PROGRAM};
pub use changes::{ChangeSet, parse_porcelain_z};
pub use commits::{CommitInfo, describe_commit};
pub use error::{Error, Result};
pub use native::NativeGit;
pub use provider::{CommitId, GitContext, Side, Vcs};
