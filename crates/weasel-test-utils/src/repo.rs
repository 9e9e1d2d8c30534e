//! [`LinkedPair`] builder for two-location scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::git::{bare_remote, collaborator_clone, git, real_git_repo_with_commit};

/// A temporary tree holding a slow-side checkout, the place its fast-side
/// worktree goes, and a bare `origin` remote.
///
/// ```text
/// <root>/slow/foo     primary checkout on `main`
/// <root>/fast/foo     mirror location (absent until linked)
/// <root>/remote.git   bare origin
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use weasel_test_utils::repo::LinkedPair;
///
/// let pair = LinkedPair::new();
/// pair.link();
/// pair.write_mirror("src/lib.rs", "fn main() {}");
/// ```
pub struct LinkedPair {
    _temp_dir: TempDir,
    root: PathBuf,
}

impl Default for LinkedPair {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkedPair {
    /// Primary with one commit on `main`, pushed to a bare origin.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        // Resolve symlinked temp dirs so paths compare equal to canonical ones
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        let pair = Self {
            _temp_dir: temp_dir,
            root,
        };
        real_git_repo_with_commit(&pair.primary());
        bare_remote(&pair.primary(), &pair.remote());
        pair
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn primary(&self) -> PathBuf {
        self.root.join("slow").join("foo")
    }

    pub fn mirror_root(&self) -> PathBuf {
        self.root.join("fast")
    }

    pub fn mirror(&self) -> PathBuf {
        self.mirror_root().join("foo")
    }

    pub fn remote(&self) -> PathBuf {
        self.root.join("remote.git")
    }

    /// Registry file location inside the temp tree.
    pub fn registry(&self) -> PathBuf {
        self.root.join("weaseltree.toml")
    }

    /// Link by hand with the git CLI: detach the primary and add the mirror
    /// worktree on `main`.
    pub fn link(&self) {
        git(&self.primary(), &["checkout", "--detach"]);
        let mirror = self.mirror();
        let mirror_str = mirror.to_string_lossy();
        git(&self.primary(), &["worktree", "add", mirror_str.as_ref(), "main"]);
    }

    /// A second clone of the remote acting as another contributor.
    pub fn collaborator(&self) -> PathBuf {
        let dest = self.root.join("other");
        if !dest.exists() {
            collaborator_clone(&self.remote(), &dest);
        }
        dest
    }

    pub fn write_primary(&self, relative: &str, content: &str) {
        write(&self.primary(), relative, content);
    }

    pub fn write_mirror(&self, relative: &str, content: &str) {
        write(&self.mirror(), relative, content);
    }

    pub fn read_primary(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.primary().join(relative)).ok()
    }

    pub fn read_mirror(&self, relative: &str) -> Option<String> {
        fs::read_to_string(self.mirror().join(relative)).ok()
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
