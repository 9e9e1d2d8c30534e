//! Clone command implementation

use std::path::{Path, PathBuf};

use weasel_core::{CloneOptions, SettingsOverrides};
use weasel_fs::NormalizedPath;

use super::{Session, print_report};
use crate::error::Result;

/// Run the clone command
pub fn run_clone(
    cwd: &Path,
    overrides: SettingsOverrides,
    target: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let mut session = Session::open(cwd, overrides)?;
    let options = CloneOptions {
        target: target.map(|t| NormalizedPath::new(absolutize(cwd, t))),
        force,
    };

    let (mut reconciler, invocation) = session.reconciler();
    let report = reconciler.clone(invocation, options)?;
    print_report(&report);
    Ok(())
}

/// Interpret a relative target against the directory the user typed it in.
fn absolutize(cwd: &Path, target: PathBuf) -> PathBuf {
    if target.is_absolute() {
        target
    } else {
        cwd.join(target)
    }
}
