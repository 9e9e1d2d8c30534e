//! Bridged git context: runs an external git binary
//!
//! The slow side is driven through the host's own git (`git.exe` under
//! WSL) so that its configuration applies: line-ending conversion,
//! credential helpers and file-mode handling. Each call is one subprocess
//! run with the location as its working directory.

use std::io;
use std::path::Path;
use std::process::{Command, Output};

use weasel_fs::NormalizedPath;

use crate::changes::parse_porcelain_z;
use crate::{ChangeSet, CommitId, Error, GitContext, Result};

/// Binary used when none is configured.
pub const DEFAULT_BRIDGE_PROGRAM: &str = "git.exe";

/// [`GitContext`] implemented by spawning a git binary.
#[derive(Debug, Clone)]
pub struct BridgeGit {
    program: String,
}

impl Default for BridgeGit {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_PROGRAM)
    }
}

impl BridgeGit {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn(&self, location: &Path, args: &[&str]) -> Result<Output> {
        tracing::debug!(
            context = "bridge",
            program = %self.program,
            location = %location.display(),
            args = %args.join(" "),
            "running git"
        );
        Command::new(&self.program)
            .args(args)
            .current_dir(location)
            .output()
            .map_err(|e| self.spawn_error(location, e))
    }

    fn spawn_error(&self, location: &Path, e: io::Error) -> Error {
        // current_dir failures also surface as NotFound; only blame the
        // binary when the directory is actually there
        if e.kind() == io::ErrorKind::NotFound && location.is_dir() {
            Error::ToolUnavailable {
                program: self.program.clone(),
                reason: e.to_string(),
            }
        } else {
            Error::io(location, e)
        }
    }

    fn failure(&self, location: &Path, args: &[&str], output: &Output) -> Error {
        Error::CommandFailed {
            program: self.program.clone(),
            args: args.join(" "),
            location: location.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    /// Run and return trimmed stdout, failing on a non-zero exit.
    fn run(&self, location: &Path, args: &[&str]) -> Result<String> {
        let output = self.spawn(location, args)?;
        if !output.status.success() {
            return Err(self.failure(location, args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitContext for BridgeGit {
    fn name(&self) -> &str {
        &self.program
    }

    fn ensure_available(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| Error::ToolUnavailable {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(Error::ToolUnavailable {
                program: self.program.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn current_branch(&self, location: &Path) -> Result<Option<String>> {
        let branch = self.run(location, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(if branch == "HEAD" { None } else { Some(branch) })
    }

    fn head_commit(&self, location: &Path) -> Result<CommitId> {
        Ok(CommitId::new(self.run(location, &["rev-parse", "HEAD"])?))
    }

    fn status(&self, location: &Path) -> Result<ChangeSet> {
        let args = ["status", "--porcelain=v1", "-z", "--untracked-files=all"];
        let output = self.spawn(location, &args)?;
        if !output.status.success() {
            return Err(self.failure(location, &args, &output));
        }
        parse_porcelain_z(&String::from_utf8_lossy(&output.stdout), &self.program)
    }

    fn common_dir(&self, location: &Path) -> Result<NormalizedPath> {
        let dir = self.run(location, &["rev-parse", "--path-format=absolute", "--git-common-dir"])?;
        Ok(NormalizedPath::canonical(dir))
    }

    fn is_ancestor(&self, location: &Path, ancestor: &CommitId, descendant: &CommitId) -> Result<bool> {
        let args = ["merge-base", "--is-ancestor", ancestor.as_str(), descendant.as_str()];
        let output = self.spawn(location, &args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(self.failure(location, &args, &output)),
        }
    }

    fn branches_containing(&self, location: &Path, commit: &CommitId) -> Result<Vec<String>> {
        let contains = format!("--contains={}", commit.as_str());
        let output = self.run(
            location,
            &["for-each-ref", contains.as_str(), "--format=%(refname:short)", "refs/heads"],
        )?;
        let mut branches: Vec<String> = output.lines().map(str::to_string).collect();
        branches.sort();
        Ok(branches)
    }

    fn detach_head(&self, location: &Path) -> Result<()> {
        let changes = self.status(location)?;
        if changes.has_tracked_changes() {
            return Err(Error::Dirty {
                location: location.to_path_buf(),
                count: changes.tracked_count(),
            });
        }
        self.run(location, &["checkout", "--detach"])?;
        Ok(())
    }

    fn checkout_branch(&self, location: &Path, branch: &str) -> Result<()> {
        self.run(location, &["checkout", branch])?;
        Ok(())
    }

    fn checkout_detached(&self, location: &Path, commit: &CommitId, force: bool) -> Result<()> {
        let mut args = vec!["checkout"];
        if force {
            args.push("--force");
        }
        args.extend(["--detach", commit.as_str()]);
        self.run(location, &args)?;
        Ok(())
    }

    fn create_linked_worktree(&self, source: &Path, target: &Path, branch: &str) -> Result<()> {
        let target = target.to_string_lossy();
        self.run(source, &["worktree", "add", target.as_ref(), branch])?;
        Ok(())
    }

    fn fetch(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");
        self.run(location, &["fetch", remote, refspec.as_str()])?;
        Ok(())
    }

    fn fast_forward_merge(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        match self.current_branch(location)? {
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

        let upstream_ref = format!("refs/remotes/{remote}/{branch}");
        let upstream = CommitId::new(self.run(location, &["rev-parse", upstream_ref.as_str()])?);
        let local = self.head_commit(location)?;
        if !self.is_ancestor(location, &local, &upstream)? {
            if self.is_ancestor(location, &upstream, &local)? {
                return Ok(());
            }
            return Err(Error::Diverged {
                branch: branch.to_string(),
                location: location.to_path_buf(),
                local: local.to_string(),
                upstream: upstream.to_string(),
            });
        }

        self.run(location, &["merge", "--ff-only", upstream_ref.as_str()])?;
        Ok(())
    }

    fn push(&self, location: &Path, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        let args = ["push", remote, refspec.as_str()];
        let output = self.spawn(location, &args)?;
        if !output.status.success() {
            return Err(Error::PushFailed {
                remote: remote.to_string(),
                branch: branch.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
