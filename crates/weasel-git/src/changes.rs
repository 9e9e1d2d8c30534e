//! Working-tree change sets
//!
//! A [`ChangeSet`] partitions the uncommitted state of one location into
//! modified, added, untracked and deleted paths. It is always produced fresh
//! from the repository and never cached between operations.

use serde::Serialize;

use crate::{Error, Result};

/// Uncommitted state of a working tree, as repository-relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Tracked files whose content or mode changed (including conflicts)
    pub modified: Vec<String>,
    /// Files newly added to the index
    pub added: Vec<String>,
    /// Files git does not track and does not ignore
    pub untracked: Vec<String>,
    /// Tracked files removed from the working tree or the index
    pub deleted: Vec<String>,
}

impl ChangeSet {
    /// No uncommitted state at all.
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
            && self.added.is_empty()
            && self.untracked.is_empty()
            && self.deleted.is_empty()
    }

    /// Whether any tracked file differs from HEAD.
    ///
    /// Untracked files are not counted: moving HEAD never loses them.
    pub fn has_tracked_changes(&self) -> bool {
        !(self.modified.is_empty() && self.added.is_empty() && self.deleted.is_empty())
    }

    /// Number of tracked paths that differ from HEAD.
    pub fn tracked_count(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len()
    }

    /// Paths whose current content can be carried to another checkout:
    /// modified, added and untracked, sorted. Deletions are excluded.
    pub fn copyable(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .modified
            .iter()
            .chain(&self.added)
            .chain(&self.untracked)
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Every path mentioned in the change set, sorted.
    pub fn all_paths(&self) -> Vec<String> {
        let mut paths = self.copyable();
        paths.extend(self.deleted.iter().cloned());
        paths.sort();
        paths.dedup();
        paths
    }

    /// Sort every bucket and drop duplicates.
    pub(crate) fn normalize(mut self) -> Self {
        for bucket in [
            &mut self.modified,
            &mut self.added,
            &mut self.untracked,
            &mut self.deleted,
        ] {
            bucket.sort();
            bucket.dedup();
        }
        self
    }
}

/// Parse `git status --porcelain=v1 -z` output.
///
/// Renames and copies carry a second NUL-terminated field with the original
/// path; the new path is reported as added and, for renames, the original as
/// deleted.
pub fn parse_porcelain_z(output: &str, program: &str) -> Result<ChangeSet> {
    let mut changes = ChangeSet::default();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());

    while let Some(entry) = fields.next() {
        if entry.len() < 4 || entry.as_bytes()[2] != b' ' {
            return Err(Error::Parse {
                program: program.to_string(),
                message: format!("malformed status entry '{entry}'"),
            });
        }
        let (x, y) = (entry.as_bytes()[0], entry.as_bytes()[1]);
        let path = entry[3..].to_string();

        match (x, y) {
            (b'?', b'?') => changes.untracked.push(path),
            (b'!', b'!') => {}
            (b'D', b'D') | (b'A', b'A') | (b'U', _) | (_, b'U') => changes.modified.push(path),
            (b'R', _) | (b'C', _) => {
                let original = fields.next().ok_or_else(|| Error::Parse {
                    program: program.to_string(),
                    message: format!("rename entry '{entry}' without original path"),
                })?;
                if y == b'D' {
                    changes.deleted.push(path);
                } else {
                    changes.added.push(path);
                }
                if x == b'R' {
                    changes.deleted.push(original.to_string());
                }
            }
            (b'D', _) | (_, b'D') => changes.deleted.push(path),
            (b'A', _) => changes.added.push(path),
            _ => changes.modified.push(path),
        }
    }

    Ok(changes.normalize())
}
