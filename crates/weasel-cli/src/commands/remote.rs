//! Push and pull command implementations
//!
//! Both exchange the recorded branch with the configured remote through
//! the slow-side git.

use std::path::Path;

use colored::Colorize;
use weasel_core::SettingsOverrides;

use super::{Session, print_report};
use crate::error::Result;

/// Run the push command
pub fn run_push(cwd: &Path, overrides: SettingsOverrides) -> Result<()> {
    let mut session = Session::open(cwd, overrides)?;
    announce(&session);
    let (mut reconciler, invocation) = session.reconciler();
    let report = reconciler.push(invocation)?;
    print_report(&report);
    Ok(())
}

/// Run the pull command
pub fn run_pull(cwd: &Path, overrides: SettingsOverrides) -> Result<()> {
    let mut session = Session::open(cwd, overrides)?;
    announce(&session);
    let (mut reconciler, invocation) = session.reconciler();
    let report = reconciler.pull(invocation)?;
    print_report(&report);
    Ok(())
}

fn announce(session: &Session) {
    println!(
        "{} remote {} via {}",
        "=>".blue().bold(),
        session.settings.remote.cyan(),
        session.settings.bridge_git.dimmed()
    );
}
