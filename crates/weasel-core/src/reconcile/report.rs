//! Reports returned by reconciliation operations

use std::fmt;

use serde::Serialize;
use weasel_git::{CommitInfo, Side};
use weasel_fs::NormalizedPath;

use super::drift::{DriftReport, LinkState};
use crate::registry::LinkRecord;

/// The state-changing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Clone,
    Sync,
    Up,
    Push,
    Pull,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Clone => "clone",
            Operation::Sync => "sync",
            Operation::Up => "up",
            Operation::Push => "push",
            Operation::Pull => "pull",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub operation: Operation,
    pub identity: String,
    /// Human-readable steps taken, in order
    pub actions: Vec<String>,
    /// Paths deliberately left alone
    pub skipped: Vec<String>,
    /// State after the operation
    pub state: LinkState,
    pub dry_run: bool,
}

impl OperationReport {
    pub fn new(operation: Operation, identity: impl Into<String>) -> Self {
        Self {
            operation,
            identity: identity.into(),
            actions: Vec::new(),
            skipped: Vec::new(),
            state: LinkState::LinkedClean,
            dry_run: false,
        }
    }

    pub fn action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    /// Whether nothing was done.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Read-only view of one identity, as printed by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub identity: String,
    pub side: Side,
    pub location: NormalizedPath,
    pub state: LinkState,
    pub record: Option<LinkRecord>,
    pub drift: Option<DriftReport>,
    pub primary_commit: Option<CommitInfo>,
    pub mirror_commit: Option<CommitInfo>,
}
