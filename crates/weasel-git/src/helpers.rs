//! Shared git2 helper functions
//!
//! Free functions over an open [`Repository`] used by the native context.
//! They never shell out and never force over local changes unless told to.

use std::fs;
use std::path::Path;

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Oid, PushOptions, RemoteCallbacks, Repository, Status, StatusOptions,
    WorktreeAddOptions,
};

use crate::{ChangeSet, CommitId, Error, Result};

/// Get the current branch name from a repository.
///
/// Returns the branch name if HEAD points to a branch, or `None` if HEAD is detached.
pub fn get_current_branch(repo: &Repository) -> Result<Option<String>> {
    if repo.head_detached()? {
        return Ok(None);
    }
    let head = repo.head()?;
    Ok(head.shorthand().map(str::to_string))
}

/// Commit HEAD resolves to.
pub fn head_oid(repo: &Repository) -> Result<Oid> {
    Ok(repo.head()?.peel_to_commit()?.id())
}

pub fn parse_oid(commit: &CommitId) -> Result<Oid> {
    Ok(Oid::from_str(commit.as_str())?)
}

/// Collect working tree status into a [`ChangeSet`].
///
/// Untracked directories are recursed so every untracked file is listed
/// individually; ignored files are left out.
pub fn collect_changes(repo: &Repository) -> Result<ChangeSet> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .include_unmodified(false);

    let statuses = repo.statuses(Some(&mut opts))?;
    let mut changes = ChangeSet::default();

    for entry in statuses.iter() {
        let path = String::from_utf8_lossy(entry.path_bytes()).into_owned();
        let status = entry.status();

        if status.is_conflicted() {
            changes.modified.push(path);
        } else if status == Status::WT_NEW {
            changes.untracked.push(path);
        } else if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
            changes.deleted.push(path);
        } else if status.contains(Status::INDEX_NEW) {
            changes.added.push(path);
        } else if !status.is_ignored() && !status.is_empty() {
            changes.modified.push(path);
        }
    }

    Ok(changes.normalize())
}

/// Check out `oid`'s tree into the working directory.
pub fn checkout_commit(repo: &Repository, oid: Oid, force: bool) -> Result<()> {
    let commit = repo.find_commit(oid)?;
    let mut builder = CheckoutBuilder::new();
    if force {
        builder.force();
    } else {
        builder.safe();
    }
    repo.checkout_tree(commit.as_object(), Some(&mut builder))?;
    Ok(())
}

/// Add a linked worktree at `target` on the existing local `branch`.
///
/// An empty directory at `target` is replaced; anything else already there
/// is refused.
pub fn add_worktree_for_branch(repo: &Repository, target: &Path, branch: &str) -> Result<()> {
    let branch_ref = repo
        .find_branch(branch, BranchType::Local)
        .map_err(|_| Error::BranchNotFound {
            name: branch.to_string(),
        })?
        .into_reference();

    if target.exists() {
        let empty = target.is_dir()
            && fs::read_dir(target)
                .map_err(|e| Error::io(target, e))?
                .next()
                .is_none();
        if !empty {
            return Err(Error::TargetNotEmpty {
                path: target.to_path_buf(),
            });
        }
        fs::remove_dir(target).map_err(|e| Error::io(target, e))?;
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let name = unique_worktree_name(repo, target)?;
    let mut opts = WorktreeAddOptions::new();
    opts.reference(Some(&branch_ref));
    repo.worktree(&name, target, Some(&opts))?;

    Ok(())
}

/// Administrative name for a new worktree: the target's directory name,
/// suffixed until it does not collide with an existing one.
fn unique_worktree_name(repo: &Repository, target: &Path) -> Result<String> {
    let base: String = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mirror".to_string())
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();

    let existing = repo.worktrees()?;
    let taken = |name: &str| existing.iter().flatten().any(|n| n == name);

    let mut name = base.clone();
    let mut n = 1;
    while taken(&name) {
        n += 1;
        name = format!("{base}-{n}");
    }
    Ok(name)
}

/// Local branches whose tip is `oid` or a descendant of it, sorted by name.
pub fn branches_containing(repo: &Repository, oid: Oid) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = entry?;
        let Some(tip) = branch.get().target() else {
            continue;
        };
        if (tip == oid || repo.graph_descendant_of(tip, oid)?)
            && let Some(name) = branch.name()?
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Fetch a single branch into its remote-tracking ref.
pub fn fetch_branch(repo: &Repository, remote_name: &str, branch: &str) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| Error::RemoteNotFound {
            name: remote_name.to_string(),
        })?;

    let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote_name}/{branch}");
    remote.fetch(&[&refspec], None, None)?;
    Ok(())
}

/// Fast-forward the checked-out `branch` to `<remote>/<branch>`.
///
/// The working tree is updated with a safe checkout before the branch ref
/// moves, so a conflicting local edit aborts with the branch untouched.
pub fn fast_forward(repo: &Repository, location: &Path, remote_name: &str, branch: &str) -> Result<()> {
    match get_current_branch(repo)? {
        None => {
            return Err(Error::DetachedHead {
                location: location.to_path_buf(),
            });
        }
        Some(current) if current != branch => {
            return Err(Error::WrongBranch {
                location: location.to_path_buf(),
                expected: branch.to_string(),
                actual: current,
            });
        }
        Some(_) => {}
    }

    let upstream_name = format!("refs/remotes/{remote_name}/{branch}");
    let upstream = repo
        .find_reference(&upstream_name)
        .map_err(|_| Error::BranchNotFound {
            name: format!("{remote_name}/{branch}"),
        })?
        .peel_to_commit()?
        .id();
    let local = head_oid(repo)?;

    if local == upstream || repo.graph_descendant_of(local, upstream)? {
        tracing::debug!(branch, "already up to date");
        return Ok(());
    }
    if !repo.graph_descendant_of(upstream, local)? {
        return Err(Error::Diverged {
            branch: branch.to_string(),
            location: location.to_path_buf(),
            local: local.to_string(),
            upstream: upstream.to_string(),
        });
    }

    checkout_commit(repo, upstream, false)?;
    let mut reference = repo.find_reference(&format!("refs/heads/{branch}"))?;
    reference.set_target(upstream, &format!("pull: fast-forward to {upstream}"))?;
    Ok(())
}

/// Push a local branch to the same name on `remote`.
///
/// Per-ref rejections reported by the remote are surfaced as
/// [`Error::PushFailed`].
pub fn push_branch(repo: &Repository, remote_name: &str, branch: &str) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| Error::RemoteNotFound {
            name: remote_name.to_string(),
        })?;

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    let failed = |message: String| Error::PushFailed {
        remote: remote_name.to_string(),
        branch: branch.to_string(),
        message,
    };

    let mut rejection: Option<String> = None;
    {
        let mut callbacks = RemoteCallbacks::new();
        callbacks.push_update_reference(|refname, status| {
            if let Some(message) = status {
                rejection = Some(format!("{refname}: {message}"));
            }
            Ok(())
        });
        let mut opts = PushOptions::new();
        opts.remote_callbacks(callbacks);

        remote
            .push(&[&refspec], Some(&mut opts))
            .map_err(|e| failed(e.message().to_string()))?;
    }

    match rejection {
        Some(message) => Err(failed(message)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo_with_commit(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let sig = git2::Signature::now("Test User", "test@test.com").unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial", &tree, &[])
                .unwrap();
        }
        repo
    }

    #[test]
    fn current_branch_on_fresh_repo() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_with_commit(temp_dir.path());

        let branch = get_current_branch(&repo).unwrap();
        // Default branch is either "main" or "master" depending on git config
        assert!(branch == Some("main".to_string()) || branch == Some("master".to_string()));
    }

    #[test]
    fn current_branch_is_none_when_detached() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_with_commit(temp_dir.path());
        let oid = head_oid(&repo).unwrap();
        repo.set_head_detached(oid).unwrap();

        assert_eq!(get_current_branch(&repo).unwrap(), None);
    }

    #[test]
    fn untracked_files_are_listed_individually() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_with_commit(temp_dir.path());
        fs::create_dir_all(temp_dir.path().join("notes/deep")).unwrap();
        fs::write(temp_dir.path().join("notes/deep/a.txt"), "a").unwrap();

        let changes = collect_changes(&repo).unwrap();
        assert_eq!(changes.untracked, vec!["notes/deep/a.txt".to_string()]);
        assert!(!changes.has_tracked_changes());
    }

    #[test]
    fn worktree_name_avoids_collisions() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo_with_commit(temp_dir.path().join("repo").as_path());

        let name = unique_worktree_name(&repo, &temp_dir.path().join("my repo")).unwrap();
        assert_eq!(name, "my-repo");
    }
}
