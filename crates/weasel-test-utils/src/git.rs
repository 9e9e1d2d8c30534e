//! Git repository fixtures built with the `git` CLI and `git2`.
//!
//! Fixtures panic on failure: they are setup, not behaviour under test.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Run `git` in `path` and return trimmed stdout.
///
/// # Panics
/// Panics if git cannot be started or exits non-zero.
pub fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("failed to run `git {args:?}` in {}: {e}", path.display()));
    if !output.status.success() {
        panic!(
            "`git {args:?}` failed in {}:\n{}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialises a real git repository using `git2` (no initial commit, no config).
///
/// Use for: tests that only need a discoverable repository.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Configure identity and disable signing and line-ending conversion so
/// commits are deterministic across hosts.
pub fn configure_identity(path: &Path) {
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    git(path, &["config", "core.autocrlf", "false"]);
}

/// Initialises a repository on branch `main` with one commit adding
/// `README.md`.
pub fn real_git_repo_with_commit(path: &Path) {
    fs::create_dir_all(path).unwrap();
    git(path, &["init"]);
    // Works regardless of the host's init.defaultBranch
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_identity(path);

    fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
}

/// Write `relative` with `content`, stage everything and commit.
///
/// Returns the new HEAD commit id.
pub fn commit_file(repo: &Path, relative: &str, content: &str, message: &str) -> String {
    let file = repo.join(relative);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file, content).unwrap();
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "-m", message]);
    head(repo)
}

/// HEAD commit id.
pub fn head(repo: &Path) -> String {
    git(repo, &["rev-parse", "HEAD"])
}

/// Branch at `repo`, or `None` when detached.
pub fn branch(repo: &Path) -> Option<String> {
    let name = git(repo, &["rev-parse", "--abbrev-ref", "HEAD"]);
    (name != "HEAD").then_some(name)
}

/// Create a bare repository at `remote`, register it as `origin` of `repo`
/// and push `main` to it.
pub fn bare_remote(repo: &Path, remote: &Path) {
    fs::create_dir_all(remote).unwrap();
    git(remote, &["init", "--bare"]);
    git(remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    let remote_str = remote.to_string_lossy();
    git(repo, &["remote", "add", "origin", remote_str.as_ref()]);
    git(repo, &["push", "origin", "main"]);
}

/// Clone `remote` to `dest` as an independent collaborator checkout.
pub fn collaborator_clone(remote: &Path, dest: &Path) {
    let parent = dest.parent().unwrap();
    fs::create_dir_all(parent).unwrap();
    let remote_str = remote.to_string_lossy();
    let dest_str = dest.to_string_lossy();
    git(parent, &["clone", remote_str.as_ref(), dest_str.as_ref()]);
    configure_identity(dest);
}
