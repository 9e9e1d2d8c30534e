//! Working-tree file copier
//!
//! Copies an explicit list of repository-relative files from one checkout
//! to another. It never deletes and never touches VCS metadata; files whose
//! destination already holds identical bytes are left alone, so repeating a
//! copy with no source changes performs no writes.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::checksum::file_state;
use crate::{Error, Result, validate_relative_path};

/// Outcome of a [`copy_paths`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    /// Paths written to the destination
    pub copied: Vec<String>,
    /// Paths whose destination already matched the source
    pub unchanged: Vec<String>,
    /// Paths listed for copying that no longer exist at the source
    pub missing: Vec<String>,
}

impl CopyReport {
    /// Whether the run wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.copied.is_empty()
    }
}

/// Copy `paths` (relative to `source_root`) to the same relative locations
/// under `dest_root`, creating intermediate directories.
///
/// With `dry_run` the report describes what would be copied and nothing is
/// written.
///
/// # Errors
///
/// Fails on the first unsafe path (absolute or containing `..`) before any
/// file is written, and on any I/O error while copying.
pub fn copy_paths<S: AsRef<str>>(
    source_root: &Path,
    dest_root: &Path,
    paths: &[S],
    dry_run: bool,
) -> Result<CopyReport> {
    for path in paths {
        validate_relative_path(path.as_ref())?;
    }

    let mut report = CopyReport::default();

    for path in paths {
        let relative = path.as_ref();
        let src = source_root.join(relative);
        let dst = dest_root.join(relative);

        // Directories show up when a submodule or nested repo is untracked
        if src.is_dir() {
            tracing::debug!(path = relative, "skipping directory entry");
            continue;
        }

        let Some(src_sum) = file_state(&src).map_err(|e| Error::io(&src, e))? else {
            report.missing.push(relative.to_string());
            continue;
        };

        let dst_sum = if dst.is_file() {
            file_state(&dst).map_err(|e| Error::io(&dst, e))?
        } else {
            None
        };
        if dst_sum.as_deref() == Some(src_sum.as_str()) {
            report.unchanged.push(relative.to_string());
            continue;
        }

        if !dry_run {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::copy(&src, &dst).map_err(|e| Error::io(&dst, e))?;
            tracing::debug!(path = relative, "copied");
        }
        report.copied.push(relative.to_string());
    }

    Ok(report)
}
