//! Sync command implementation

use std::path::Path;

use weasel_core::SettingsOverrides;

use super::{Session, print_report};
use crate::error::Result;

/// Run the sync command
pub fn run_sync(cwd: &Path, overrides: SettingsOverrides) -> Result<()> {
    let mut session = Session::open(cwd, overrides)?;
    let (mut reconciler, invocation) = session.reconciler();
    let report = reconciler.sync(invocation)?;
    print_report(&report);
    Ok(())
}
