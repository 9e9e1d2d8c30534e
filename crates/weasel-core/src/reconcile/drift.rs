//! Drift detection between the two locations of a link
//!
//! Drift is never persisted: every report is computed from the repositories
//! at the moment it is asked for.

use serde::Serialize;
use weasel_git::{ChangeSet, CommitId, Side, Vcs};

use crate::Result;
use crate::registry::LinkRecord;

/// How the two locations of a link relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Drift {
    /// Same commit, no uncommitted changes on either side
    InSync,
    /// The primary has commits the mirror lacks
    MirrorBehind,
    /// The mirror has commits the primary lacks
    PrimaryBehind,
    /// Each side has commits the other lacks
    Diverged,
    /// Uncommitted changes at the mirror location
    DirtyMirror,
    /// Uncommitted changes at the primary location
    DirtyPrimary,
}

/// Coarse state of an identity, derived from its drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkState {
    Unlinked,
    LinkedClean,
    LinkedDirty,
    LinkedDiverged,
}

impl Drift {
    pub fn link_state(self) -> LinkState {
        match self {
            Drift::InSync => LinkState::LinkedClean,
            Drift::PrimaryBehind | Drift::DirtyPrimary | Drift::DirtyMirror => {
                LinkState::LinkedDirty
            }
            Drift::MirrorBehind | Drift::Diverged => LinkState::LinkedDiverged,
        }
    }
}

/// Observations the classification is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftInputs {
    pub same_head: bool,
    /// Primary head is reachable from the mirror head
    pub primary_is_ancestor: bool,
    /// Mirror head is reachable from the primary head
    pub mirror_is_ancestor: bool,
    pub primary_dirty: bool,
    pub mirror_dirty: bool,
}

/// Classify drift. When several conditions hold the most severe wins:
/// `Diverged`, `MirrorBehind`, `PrimaryBehind`, `DirtyPrimary`,
/// `DirtyMirror`, then `InSync`.
pub fn classify(inputs: DriftInputs) -> Drift {
    if !inputs.same_head {
        match (inputs.primary_is_ancestor, inputs.mirror_is_ancestor) {
            (false, false) => return Drift::Diverged,
            (_, true) => return Drift::MirrorBehind,
            (true, false) => return Drift::PrimaryBehind,
        }
    }
    if inputs.primary_dirty {
        Drift::DirtyPrimary
    } else if inputs.mirror_dirty {
        Drift::DirtyMirror
    } else {
        Drift::InSync
    }
}

/// Drift classification with the evidence behind it.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub drift: Drift,
    pub state: LinkState,
    pub recorded_branch: String,
    /// Branch observed at the mirror, `None` when detached
    pub mirror_branch: Option<String>,
    /// Branch observed at the primary, `None` when detached (the normal case)
    pub primary_branch: Option<String>,
    pub primary_head: CommitId,
    pub mirror_head: CommitId,
    pub primary_changes: ChangeSet,
    pub mirror_changes: ChangeSet,
}

impl DriftReport {
    /// Whether the mirror is on a different branch than recorded.
    pub fn branch_changed(&self) -> bool {
        self.mirror_branch
            .as_deref()
            .is_some_and(|branch| branch != self.recorded_branch)
    }
}

/// Computes [`DriftReport`]s for recorded links.
pub struct DriftDetector<'a> {
    vcs: &'a Vcs,
}

impl<'a> DriftDetector<'a> {
    pub fn new(vcs: &'a Vcs) -> Self {
        Self { vcs }
    }

    pub fn detect(&self, record: &LinkRecord) -> Result<DriftReport> {
        let primary = record.primary_location.to_native();
        let mirror = record.mirror_location.to_native();
        let primary_ctx = self.vcs.at(Side::Primary);
        let mirror_ctx = self.vcs.at(Side::Mirror);

        let primary_head = primary_ctx.head_commit(&primary)?;
        let mirror_head = mirror_ctx.head_commit(&mirror)?;
        let primary_changes = primary_ctx.status(&primary)?;
        let mirror_changes = mirror_ctx.status(&mirror)?;

        let same_head = primary_head == mirror_head;
        let (primary_is_ancestor, mirror_is_ancestor) = if same_head {
            (true, true)
        } else {
            let inspect = self.vcs.inspect();
            (
                inspect.is_ancestor(&mirror, &primary_head, &mirror_head)?,
                inspect.is_ancestor(&mirror, &mirror_head, &primary_head)?,
            )
        };

        let drift = classify(DriftInputs {
            same_head,
            primary_is_ancestor,
            mirror_is_ancestor,
            primary_dirty: !primary_changes.is_empty(),
            mirror_dirty: !mirror_changes.is_empty(),
        });
        tracing::debug!(identity = %record.identity, ?drift, "classified drift");

        Ok(DriftReport {
            drift,
            state: drift.link_state(),
            recorded_branch: record.branch.clone(),
            mirror_branch: mirror_ctx.current_branch(&mirror)?,
            primary_branch: primary_ctx.current_branch(&primary)?,
            primary_head,
            mirror_head,
            primary_changes,
            mirror_changes,
        })
    }
}
