//! Commit summaries for status reports

use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::Repository;
use serde::Serialize;

use crate::helpers::parse_oid;
use crate::{CommitId, Result};

/// Information about a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Full commit id
    pub id: CommitId,

    /// Short commit hash (7 characters)
    pub hash: String,

    /// First line of the commit message
    pub message: String,

    /// Commit author name
    pub author: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

/// Summarize `commit` as seen from the repository at `location`.
pub fn describe_commit(location: &Path, commit: &CommitId) -> Result<CommitInfo> {
    let repo = Repository::open(location)?;
    let commit = repo.find_commit(parse_oid(commit)?)?;
    let oid = commit.id();

    let timestamp: DateTime<Utc> = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default();

    let message = commit
        .summary()
        .unwrap_or("")
        .to_string();

    let author = commit.author();
    let author_name = author.name().unwrap_or("Unknown").to_string();

    Ok(CommitInfo {
        id: CommitId::new(oid.to_string()),
        hash: format!("{:.7}", oid),
        message,
        author: author_name,
        timestamp,
    })
}
