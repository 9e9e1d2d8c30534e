//! In-process git context backed by libgit2
//!
//! Used for the fast-side mirror and for metadata queries against either
//! location. Nothing here spawns a process.

use std::path::Path;

use git2::Repository;
use weasel_fs::NormalizedPath;

use crate::helpers;
use crate::{ChangeSet, CommitId, Error, GitContext, Result};

/// [`GitContext`] implemented with `git2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeGit;

impl NativeGit {
    pub fn new() -> Self {
        Self
    }

    fn open(&self, location: &Path) -> Result<Repository> {
        tracing::debug!(context = "native", location = %location.display(), "opening repository");
        Ok(Repository::open(location)?)
    }
}

impl GitContext for NativeGit {
    fn name(&self) -> &str {
        "libgit2"
    }

    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    fn current_branch(&self, location: &Path) -> Result<Option<String>> {
        helpers::get_current_branch(&self.open(location)?)
    }

    fn head_commit(&self, location: &Path) -> Result<CommitId> {
        let oid = helpers::head_oid(&self.open(location)?)?;
        Ok(CommitId::new(oid.to_string()))
    }

    fn status(&self, location: &Path) -> Result<ChangeSet> {
        helpers::collect_changes(&self.open(location)?)
    }

    fn common_dir(&self, location: &Path) -> Result<NormalizedPath> {
        let repo = self.open(location)?;
        Ok(NormalizedPath::canonical(repo.commondir()))
    }

    fn is_ancestor(&self, location: &Path, ancestor: &CommitId, descendant: &CommitId) -> Result<bool> {
        let repo = self.open(location)?;
        let ancestor = helpers::parse_oid(ancestor)?;
        let descendant = helpers::parse_oid(descendant)?;
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn branches_containing(&self, location: &Path, commit: &CommitId) -> Result<Vec<String>> {
        let repo = self.open(location)?;
        helpers::branches_containing(&repo, helpers::parse_oid(commit)?)
    }

    fn detach_head(&self, location: &Path) -> Result<()> {
        let repo = self.open(location)?;
        let changes = helpers::collect_changes(&repo)?;
        if changes.has_tracked_changes() {
            return Err(Error::Dirty {
                location: location.to_path_buf(),
                count: changes.tracked_count(),
            });
        }
        let oid = helpers::head_oid(&repo)?;
        repo.set_head_detached(oid)?;
        Ok(())
    }

    fn checkout_branch(&self, location: &Path, branch: &str) -> Result<()> {
        let repo = self.open(location)?;
        let target = repo
            .find_branch(branch, git2::BranchType::Local)
            .map_err(|_| Error::BranchNotFound {
                name: branch.to_string(),
            })?
            .get()
            .peel_to_commit()?
            .id();

        helpers::checkout_commit(&repo, target, false)?;
        repo.set_head(&format!("refs/heads/{branch}"))?;
        Ok(())
    }

    fn checkout_detached(&self, location: &Path, commit: &CommitId, force: bool) -> Result<()> {
        let repo = self.open(location)?;
        let oid = helpers::parse_oid(commit)?;
        helpers::checkout_commit(&repo, oid, force)?;
        repo.set_head_detached(oid)?;
        Ok(())
    }

    fn create_linked_worktree(&self, source: &Path, target: &Path, branch: &str) -> Result<()> {
        let repo = self.open(source)?;
        helpers::add_worktree_for_branch(&repo, target, branch)
    }

    fn fetch(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        helpers::fetch_branch(&self.open(location)?, remote, branch)
    }

    fn fast_forward_merge(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        helpers::fast_forward(&self.open(location)?, location, remote, branch)
    }

    fn push(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        helpers::push_branch(&self.open(location)?, remote, branch)
    }
}
