//! Up command implementation

use std::path::Path;

use weasel_core::SettingsOverrides;

use super::{Session, print_report};
use crate::error::Result;

/// Run the up command
pub fn run_up(cwd: &Path, overrides: SettingsOverrides, dry_run: bool) -> Result<()> {
    let mut session = Session::open(cwd, overrides)?;
    let (mut reconciler, invocation) = session.reconciler();
    let report = reconciler.up(invocation, dry_run)?;
    print_report(&report);
    Ok(())
}
