//! Execution-context trait for git operations
//!
//! Both linked locations are worktrees of the same repository, but they are
//! operated on through different execution paths. [`GitContext`] is the
//! capability surface the reconciliation engine needs; [`Vcs`] pairs the two
//! concrete contexts and picks one per side.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use weasel_fs::NormalizedPath;

use crate::{ChangeSet, Result};

/// Opaque commit identifier (full hex object id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(7)]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which of the two linked locations a command or step concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The original checkout on the slow mount; detached after linking.
    Primary,
    /// The linked worktree on the fast filesystem where work happens.
    Mirror,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Primary => f.write_str("primary"),
            Side::Mirror => f.write_str("mirror"),
        }
    }
}

/// Git operations against a location, through one execution path.
///
/// Every method takes the worktree location explicitly; implementations hold
/// no per-repository state so one context serves both locations.
pub trait GitContext {
    /// Short label used in logs and error messages.
    fn name(&self) -> &str;

    /// Fail with `ToolUnavailable` when this execution path cannot run.
    fn ensure_available(&self) -> Result<()>;

    /// Branch checked out at `location`, or `None` when HEAD is detached.
    fn current_branch(&self, location: &Path) -> Result<Option<String>>;

    /// Commit HEAD points at.
    fn head_commit(&self, location: &Path) -> Result<CommitId>;

    /// Uncommitted state of the working tree.
    fn status(&self, location: &Path) -> Result<ChangeSet>;

    /// Canonical path of the shared git directory (same for all linked worktrees).
    fn common_dir(&self, location: &Path) -> Result<NormalizedPath>;

    /// Whether `ancestor` is reachable from `descendant` (or equal to it).
    fn is_ancestor(&self, location: &Path, ancestor: &CommitId, descendant: &CommitId) -> Result<bool>;

    /// Local branches whose tip reaches `commit`, sorted by name.
    fn branches_containing(&self, location: &Path, commit: &CommitId) -> Result<Vec<String>>;

    /// Detach HEAD at its current commit. Refuses with `Dirty` when tracked
    /// changes exist.
    fn detach_head(&self, location: &Path) -> Result<()>;

    /// Switch `location` to `branch` without forcing over local changes.
    fn checkout_branch(&self, location: &Path, branch: &str) -> Result<()>;

    /// Point a detached HEAD at `commit` and update the working tree.
    ///
    /// With `force` local modifications to tracked files are overwritten;
    /// callers must have established that nothing is lost.
    fn checkout_detached(&self, location: &Path, commit: &CommitId, force: bool) -> Result<()>;

    /// Add a linked worktree at `target` checked out on the existing
    /// `branch`. `target` must not exist or be an empty directory.
    fn create_linked_worktree(&self, source: &Path, target: &Path, branch: &str) -> Result<()>;

    /// Fetch `branch` from `remote` into `refs/remotes/<remote>/<branch>`.
    fn fetch(&self, location: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Fast-forward the local `branch` (checked out at `location`) to
    /// `<remote>/<branch>`. Fails with `Diverged` when that is not a
    /// fast-forward; never creates a merge commit.
    fn fast_forward_merge(&self, location: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Push the local `branch` to `remote`.
    fn push(&self, location: &Path, remote: &str, branch: &str) -> Result<()>;

    /// Fetch then fast-forward.
    fn pull(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        self.fetch(location, remote, branch)?;
        self.fast_forward_merge(location, remote, branch)
    }
}

/// The pair of execution contexts used by one invocation.
///
/// Primary-side steps run through the bridge so slow-side git configuration
/// (line endings, credential helpers) applies; mirror-side steps run
/// natively. Network steps always use the bridge because only the slow side
/// holds the remote credentials.
pub struct Vcs {
    native: Box<dyn GitContext>,
    bridge: Box<dyn GitContext>,
}

impl Vcs {
    pub fn new(native: Box<dyn GitContext>, bridge: Box<dyn GitContext>) -> Self {
        Self { native, bridge }
    }

    /// Context that operates on the given side's location.
    pub fn at(&self, side: Side) -> &dyn GitContext {
        match side {
            Side::Primary => self.bridge.as_ref(),
            Side::Mirror => self.native.as_ref(),
        }
    }

    /// Context for fetch and push.
    pub fn remote(&self) -> &dyn GitContext {
        self.bridge.as_ref()
    }

    /// Context for metadata-only inspection of either location.
    pub fn inspect(&self) -> &dyn GitContext {
        self.native.as_ref()
    }

    /// Check both execution paths can run.
    pub fn ensure_available(&self) -> Result<()> {
        self.native.ensure_available()?;
        self.bridge.ensure_available()
    }
}
