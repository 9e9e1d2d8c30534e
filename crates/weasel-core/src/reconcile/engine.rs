//! Reconciliation engine
//!
//! Moves state between the primary and mirror locations of a link. Every
//! operation runs its checks before the first mutating step, and the
//! registry is only written once an operation has succeeded.

use std::fs;
use std::path::Path;

use git2::{Repository, RepositoryState};
use weasel_fs::NormalizedPath;
use weasel_fs::checksum::file_state;
use weasel_git::{ChangeSet, GitContext, Side, Vcs, describe_commit};

use super::drift::{DriftDetector, LinkState};
use super::report::{Operation, OperationReport, StatusReport};
use crate::identity::{IdentityResolver, Invocation};
use crate::registry::{LinkRecord, LinkRegistry};
use crate::{Error, Result, Settings};

/// Options for `clone`.
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Mirror location; defaults to the recorded one, then the mirror root
    pub target: Option<NormalizedPath>,
    /// Relink even though a record exists
    pub force: bool,
}

/// Engine for reconciling the two locations of a link
///
/// Provides the operations:
/// - **clone**: create the mirror worktree and record the link
/// - **sync**: advance the detached primary to the mirror's head
/// - **up**: copy uncommitted mirror edits to the primary
/// - **push** / **pull**: exchange the tracked branch with the remote
/// - **status**: report without changing anything
pub struct Reconciler<'a> {
    registry: &'a mut LinkRegistry,
    vcs: &'a Vcs,
    resolver: &'a IdentityResolver,
    remote: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        registry: &'a mut LinkRegistry,
        vcs: &'a Vcs,
        resolver: &'a IdentityResolver,
        settings: &Settings,
    ) -> Self {
        Self {
            registry,
            vcs,
            resolver,
            remote: settings.remote.clone(),
        }
    }

    fn primary_ctx(&self) -> &'a dyn GitContext {
        self.vcs.at(Side::Primary)
    }

    fn mirror_ctx(&self) -> &'a dyn GitContext {
        self.vcs.at(Side::Mirror)
    }

    /// Link the primary at `invocation` to a mirror worktree.
    ///
    /// # Errors
    ///
    /// Fails with a precondition error when invoked from a mirror, when a
    /// link exists and `force` is not set, when the primary is detached
    /// (fresh target) or has uncommitted tracked changes, or when the target
    /// is occupied by something other than a worktree of this repository.
    pub fn clone(&mut self, invocation: &Invocation, options: CloneOptions) -> Result<OperationReport> {
        if invocation.side != Side::Primary {
            return Err(Error::precondition(format!(
                "clone must be run from the primary location, not the mirror at {}",
                invocation.location
            )));
        }
        let existing = self.registry.get(&invocation.identity).cloned();
        if let Some(ref record) = existing
            && !options.force
        {
            return Err(Error::precondition(format!(
                "'{}' is already linked to {}; pass --force to relink",
                record.identity, record.mirror_location
            )));
        }

        let primary = invocation.location.clone();
        let target = options
            .target
            .or_else(|| existing.map(|r| r.mirror_location))
            .unwrap_or_else(|| self.resolver.default_mirror_location(&invocation.identity));
        if target == primary {
            return Err(Error::precondition("mirror location must differ from the primary location"));
        }

        ensure_quiescent(Side::Primary, &primary)?;
        let mut report = OperationReport::new(Operation::Clone, &invocation.identity);

        let branch = if is_vacant(&target)? {
            self.link_fresh(&primary, &target, &mut report)?
        } else {
            self.link_existing(&primary, &target, &mut report)?
        };

        let record = LinkRecord {
            identity: invocation.identity.clone(),
            branch,
            primary_location: primary,
            mirror_location: NormalizedPath::canonical(target.to_native()),
        };
        self.registry.upsert(record.clone());
        self.registry.save()?;
        report.action(format!("recorded link {} -> {}", record.primary_location, record.mirror_location));
        report.state = self.state_of(&record)?;
        Ok(report)
    }

    /// Create a new worktree at an absent or empty target.
    fn link_fresh(&self, primary: &NormalizedPath, target: &NormalizedPath, report: &mut OperationReport) -> Result<String> {
        let primary_path = primary.to_native();
        let branch = self.primary_ctx().current_branch(&primary_path)?.ok_or_else(|| {
            Error::precondition(format!(
                "primary location {primary} is on a detached HEAD; check out the branch to link first"
            ))
        })?;
        let changes = self.primary_ctx().status(&primary_path)?;
        if changes.has_tracked_changes() {
            return Err(Error::precondition(format!(
                "primary location {primary} has {} uncommitted tracked change(s); commit or stash them first",
                changes.tracked_count()
            )));
        }
        let head = self.primary_ctx().head_commit(&primary_path)?;

        self.primary_ctx().detach_head(&primary_path)?;
        report.action(format!("detached primary at {}", head.short()));

        if let Err(err) = self
            .mirror_ctx()
            .create_linked_worktree(&primary_path, &target.to_native(), &branch)
        {
            tracing::warn!(%primary, %branch, error = %err, "worktree creation failed, re-attaching primary");
            if let Err(rollback) = self.primary_ctx().checkout_branch(&primary_path, &branch) {
                tracing::warn!(%primary, error = %rollback, "could not re-attach primary");
            }
            return Err(err.into());
        }
        report.action(format!("created mirror worktree at {target} on '{branch}'"));
        Ok(branch)
    }

    /// Adopt a target that already holds a worktree of the same repository.
    fn link_existing(&self, primary: &NormalizedPath, target: &NormalizedPath, report: &mut OperationReport) -> Result<String> {
        let primary_path = primary.to_native();
        let target_path = target.to_native();
        let inspect = self.vcs.inspect();

        let same_repo = match inspect.common_dir(&target_path) {
            Ok(dir) => dir == inspect.common_dir(&primary_path)?,
            Err(_) => false,
        };
        if !same_repo {
            return Err(Error::precondition(format!(
                "{target} exists and is not a worktree of the repository at {primary}"
            )));
        }
        ensure_quiescent(Side::Mirror, target)?;

        let mirror_branch = self.mirror_ctx().current_branch(&target_path)?;
        match self.primary_ctx().current_branch(&primary_path)? {
            Some(branch) => {
                // The branch can only be checked out at the mirror once the
                // primary lets go of it
                self.primary_ctx().detach_head(&primary_path)?;
                report.action(format!("detached primary from '{branch}'"));
                if mirror_branch.as_deref() != Some(branch.as_str()) {
                    if let Err(err) = self.mirror_ctx().checkout_branch(&target_path, &branch) {
                        tracing::warn!(%primary, %branch, error = %err, "mirror checkout failed, re-attaching primary");
                        if let Err(rollback) = self.primary_ctx().checkout_branch(&primary_path, &branch) {
                            tracing::warn!(%primary, error = %rollback, "could not re-attach primary");
                        }
                        return Err(err.into());
                    }
                    report.action(format!("switched mirror at {target} to '{branch}'"));
                }
                Ok(branch)
            }
            None => {
                let branch = mirror_branch.ok_or_else(|| {
                    Error::precondition(format!(
                        "neither {primary} nor {target} is on a branch; check out the branch to link"
                    ))
                })?;
                report.action(format!("adopted existing mirror at {target} on '{branch}'"));
                Ok(branch)
            }
        }
    }

    /// Advance the primary's detached HEAD to the mirror's head.
    ///
    /// # Errors
    ///
    /// Fails with `Diverged` when the primary is at a commit no local branch
    /// reaches (a commit made at the primary), and with a precondition error
    /// when uncommitted primary changes would be lost. A primary left on
    /// another branch's history is moved over.
    pub fn sync(&mut self, invocation: &Invocation) -> Result<OperationReport> {
        let record = self.linked_record(invocation)?;
        let mut report = OperationReport::new(Operation::Sync, &record.identity);
        let record = self.adopt_mirror_branch(record, &mut report)?;
        let primary = record.primary_location.to_native();
        let mirror = record.mirror_location.to_native();

        if let Some(branch) = self.primary_ctx().current_branch(&primary)? {
            return Err(Error::precondition(format!(
                "primary location {} is on branch '{branch}' instead of a detached HEAD; re-run `weaseltree clone --force`",
                record.primary_location
            )));
        }

        let primary_head = self.primary_ctx().head_commit(&primary)?;
        let mirror_head = self.mirror_ctx().head_commit(&mirror)?;
        if primary_head == mirror_head {
            tracing::debug!(identity = %record.identity, "heads already equal");
            return self.finish(report, &record);
        }
        let inspect = self.vcs.inspect();
        if !inspect.is_ancestor(&mirror, &primary_head, &mirror_head)? {
            // Left behind on another branch after a switch at the mirror;
            // that branch keeps the commit, so moving away loses nothing.
            let holders = inspect.branches_containing(&mirror, &primary_head)?;
            if holders.is_empty() {
                return Err(Error::Diverged(format!(
                    "primary location {} is at {}, which is not on mirror branch '{}' ({}) or any other branch; nothing was changed",
                    record.primary_location,
                    primary_head.short(),
                    record.branch,
                    mirror_head.short()
                )));
            }
            tracing::info!(
                identity = %record.identity,
                commit = %primary_head,
                branches = %holders.join(", "),
                "primary is on another branch's history, moving it to the mirror branch"
            );
            report.action(format!(
                "left {} (kept on '{}') for mirror branch '{}'",
                primary_head.short(),
                holders.join("', '"),
                record.branch
            ));
        }

        let changes = self.primary_ctx().status(&primary)?;
        let (carried, blocking) = classify_primary_changes(&primary, &mirror, &changes)?;
        if !blocking.is_empty() {
            return Err(Error::precondition(format!(
                "primary location {} has uncommitted changes not present at the mirror: {}",
                record.primary_location,
                blocking.join(", ")
            )));
        }

        let force = !carried.is_empty();
        self.primary_ctx().checkout_detached(&primary, &mirror_head, force)?;
        report.action(format!(
            "moved primary {} -> {}",
            primary_head.short(),
            mirror_head.short()
        ));
        if force {
            report.action(format!("{} carried change(s) already present at the mirror", carried.len()));
        }
        self.finish(report, &record)
    }

    /// Copy uncommitted mirror changes onto the primary's working tree.
    ///
    /// Deleted paths are reported in `skipped` and never applied.
    pub fn up(&mut self, invocation: &Invocation, dry_run: bool) -> Result<OperationReport> {
        let record = self.linked_record(invocation)?;
        let mut report = OperationReport::new(Operation::Up, &record.identity);
        report.dry_run = dry_run;
        let mirror = record.mirror_location.to_native();
        let primary = record.primary_location.to_native();

        let changes = self.mirror_ctx().status(&mirror)?;
        let copy = weasel_fs::copy_paths(&mirror, &primary, &changes.copyable(), dry_run)?;

        let verb = if dry_run { "would copy" } else { "copied" };
        report.actions.extend(copy.copied.iter().map(|path| format!("{verb} {path}")));
        for path in &copy.missing {
            tracing::debug!(%path, "vanished before copy");
        }
        for path in &changes.deleted {
            tracing::warn!(%path, "deletion at mirror not applied to primary");
            report.skipped.push(path.clone());
        }
        if !copy.unchanged.is_empty() {
            tracing::debug!(count = copy.unchanged.len(), "already identical at primary");
        }

        report.state = self.state_of(&record)?;
        Ok(report)
    }

    /// Publish the tracked branch through the primary's git.
    pub fn push(&mut self, invocation: &Invocation) -> Result<OperationReport> {
        let record = self.linked_record(invocation)?;
        let mut report = OperationReport::new(Operation::Push, &record.identity);
        let record = self.adopt_mirror_branch(record, &mut report)?;
        let primary = record.primary_location.to_native();

        self.vcs.remote().fetch(&primary, &self.remote, &record.branch)?;
        self.vcs.remote().push(&primary, &self.remote, &record.branch)?;
        report.action(format!("pushed '{}' to {}", record.branch, self.remote));
        self.finish(report, &record)
    }

    /// Fetch through the primary's git, then fast-forward the mirror.
    pub fn pull(&mut self, invocation: &Invocation) -> Result<OperationReport> {
        let record = self.linked_record(invocation)?;
        let mut report = OperationReport::new(Operation::Pull, &record.identity);
        let record = self.adopt_mirror_branch(record, &mut report)?;
        let primary = record.primary_location.to_native();
        let mirror = record.mirror_location.to_native();

        let before = self.mirror_ctx().head_commit(&mirror)?;
        self.vcs.remote().fetch(&primary, &self.remote, &record.branch)?;
        self.mirror_ctx()
            .fast_forward_merge(&mirror, &self.remote, &record.branch)?;
        let after = self.mirror_ctx().head_commit(&mirror)?;

        if before != after {
            report.action(format!(
                "fast-forwarded mirror '{}' {} -> {}",
                record.branch,
                before.short(),
                after.short()
            ));
        }
        self.finish(report, &record)
    }

    /// Describe the link for `invocation` without changing anything.
    pub fn status(&self, invocation: &Invocation) -> Result<StatusReport> {
        let Some(record) = self.registry.get(&invocation.identity).cloned() else {
            return Ok(StatusReport {
                identity: invocation.identity.clone(),
                side: invocation.side,
                location: invocation.location.clone(),
                state: LinkState::Unlinked,
                record: None,
                drift: None,
                primary_commit: None,
                mirror_commit: None,
            });
        };
        self.validate_link(&record)?;

        let drift = DriftDetector::new(self.vcs).detect(&record)?;
        let primary_commit = describe_commit(&record.primary_location.to_native(), &drift.primary_head)?;
        let mirror_commit = describe_commit(&record.mirror_location.to_native(), &drift.mirror_head)?;

        Ok(StatusReport {
            identity: record.identity.clone(),
            side: invocation.side,
            location: invocation.location.clone(),
            state: drift.state,
            record: Some(record),
            drift: Some(drift),
            primary_commit: Some(primary_commit),
            mirror_commit: Some(mirror_commit),
        })
    }

    /// Recorded link for the invocation, checked to still be a valid pair.
    fn linked_record(&self, invocation: &Invocation) -> Result<LinkRecord> {
        let record = self.registry.lookup(&invocation.identity)?.clone();
        self.validate_link(&record)?;
        Ok(record)
    }

    /// Both locations exist, share one repository and are not in the middle
    /// of another git operation.
    fn validate_link(&self, record: &LinkRecord) -> Result<()> {
        for side in [Side::Primary, Side::Mirror] {
            let location = record.location(side);
            if !location.is_dir() {
                return Err(Error::precondition(format!(
                    "{side} location {location} does not exist"
                )));
            }
        }

        let inspect = self.vcs.inspect();
        let primary_dir = inspect.common_dir(&record.primary_location.to_native())?;
        let mirror_dir = inspect.common_dir(&record.mirror_location.to_native())?;
        if primary_dir != mirror_dir {
            return Err(Error::precondition(format!(
                "{} and {} are not worktrees of the same repository",
                record.primary_location, record.mirror_location
            )));
        }

        ensure_quiescent(Side::Primary, &record.primary_location)?;
        ensure_quiescent(Side::Mirror, &record.mirror_location)
    }

    /// Follow a branch switch made at the mirror.
    ///
    /// The mirror is where work happens, so its branch wins over the record.
    fn adopt_mirror_branch(&mut self, mut record: LinkRecord, report: &mut OperationReport) -> Result<LinkRecord> {
        let observed = self
            .mirror_ctx()
            .current_branch(&record.mirror_location.to_native())?
            .ok_or_else(|| {
                Error::precondition(format!(
                    "mirror location {} is on a detached HEAD; check out a branch there first",
                    record.mirror_location
                ))
            })?;

        if observed != record.branch {
            tracing::info!(
                identity = %record.identity,
                from = %record.branch,
                to = %observed,
                "adopting branch checked out at the mirror"
            );
            report.action(format!("adopted branch '{observed}' (was '{}')", record.branch));
            record.branch = observed;
            self.registry.upsert(record.clone());
        }
        Ok(record)
    }

    /// Persist registry changes and fill in the resulting state.
    fn finish(&mut self, mut report: OperationReport, record: &LinkRecord) -> Result<OperationReport> {
        self.registry.save()?;
        report.state = self.state_of(record)?;
        Ok(report)
    }

    fn state_of(&self, record: &LinkRecord) -> Result<LinkState> {
        Ok(DriftDetector::new(self.vcs).detect(record)?.state)
    }
}

/// Refuse to act on a location with a merge, rebase or similar in progress,
/// or with another git process holding the index.
fn ensure_quiescent(side: Side, location: &NormalizedPath) -> Result<()> {
    let repo = Repository::open(location.to_native())?;
    let state = repo.state();
    if state != RepositoryState::Clean {
        return Err(Error::precondition(format!(
            "{side} location {location} has a git operation in progress ({state:?})"
        )));
    }
    if repo.path().join("index.lock").exists() {
        return Err(Error::precondition(format!(
            "{side} location {location} is locked by another git process (index.lock)"
        )));
    }
    Ok(())
}

/// Absent, or an empty directory.
fn is_vacant(path: &NormalizedPath) -> Result<bool> {
    let native = path.to_native();
    if !native.exists() {
        return Ok(true);
    }
    if !native.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(&native).map_err(|e| Error::io(&native, e))?;
    Ok(entries.next().is_none())
}

/// Split the primary's uncommitted paths into those already present with
/// the same content (or the same absence) at the mirror, and those that
/// would be lost by moving the primary.
///
/// Untracked primary files with no counterpart at the mirror are in
/// neither list: moving HEAD leaves them where they are.
fn classify_primary_changes(
    primary: &Path,
    mirror: &Path,
    changes: &ChangeSet,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut carried = Vec::new();
    let mut blocking = Vec::new();

    for path in changes.all_paths() {
        let at_primary = file_state(&primary.join(&path)).map_err(|e| Error::io(primary.join(&path), e))?;
        let at_mirror = file_state(&mirror.join(&path)).map_err(|e| Error::io(mirror.join(&path), e))?;

        if at_primary == at_mirror {
            carried.push(path);
        } else if at_mirror.is_none() && changes.untracked.contains(&path) {
            tracing::debug!(%path, "untracked at primary only, leaving in place");
        } else {
            blocking.push(path);
        }
    }
    Ok((carried, blocking))
}
