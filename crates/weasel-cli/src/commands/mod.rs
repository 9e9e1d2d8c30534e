//! Command implementations
//!
//! Every command runs against a [`Session`]: the resolved settings, the
//! loaded registry and the invocation derived from the working directory.

mod clone;
mod remote;
mod status;
mod sync;
mod up;

pub use clone::run_clone;
pub use remote::{run_pull, run_push};
pub use status::run_status;
pub use sync::run_sync;
pub use up::run_up;

use std::path::Path;

use colored::Colorize;
use weasel_core::{
    IdentityResolver, Invocation, LinkRegistry, LinkState, OperationReport, Reconciler, Settings,
    SettingsOverrides, SettingsResolver,
};
use weasel_git::Vcs;

use crate::error::Result;

/// Everything an operation needs, resolved once per process.
pub struct Session {
    pub settings: Settings,
    pub registry: LinkRegistry,
    pub resolver: IdentityResolver,
    pub invocation: Invocation,
    pub vcs: Vcs,
}

impl Session {
    /// Resolve settings, load the registry, identify `cwd` and check that
    /// both git contexts can run.
    pub fn open(cwd: &Path, overrides: SettingsOverrides) -> Result<Self> {
        let settings = SettingsResolver::new().resolve(overrides)?;
        tracing::debug!(registry = %settings.registry_path.display(), "resolved settings");

        let registry = LinkRegistry::load(&settings.registry_path)?;
        let resolver = IdentityResolver::from_settings(&settings)?;
        let invocation = resolver.resolve(cwd, &registry)?;
        tracing::debug!(
            identity = %invocation.identity,
            side = %invocation.side,
            location = %invocation.location,
            "resolved invocation"
        );
        let vcs = weasel_core::vcs_for(&settings);
        vcs.ensure_available().map_err(weasel_core::Error::from)?;

        Ok(Self {
            settings,
            registry,
            resolver,
            invocation,
            vcs,
        })
    }

    /// Split into the reconciler and the invocation it acts on.
    pub fn reconciler(&mut self) -> (Reconciler<'_>, &Invocation) {
        (
            Reconciler::new(&mut self.registry, &self.vcs, &self.resolver, &self.settings),
            &self.invocation,
        )
    }
}

/// Colored label for a link state.
pub(crate) fn state_label(state: LinkState) -> colored::ColoredString {
    match state {
        LinkState::Unlinked => "unlinked".dimmed(),
        LinkState::LinkedClean => "linked, clean".green(),
        LinkState::LinkedDirty => "linked, dirty".yellow(),
        LinkState::LinkedDiverged => "linked, diverged".red(),
    }
}

/// Print the steps of a finished operation.
pub(crate) fn print_report(report: &OperationReport) {
    let verb = report.operation.to_string();
    if report.is_noop() {
        println!(
            "{} {} {}: nothing to do",
            "=>".blue().bold(),
            verb.cyan(),
            report.identity
        );
    } else {
        println!("{} {} {}", "=>".blue().bold(), verb.cyan(), report.identity);
        for action in &report.actions {
            println!("   {} {}", "+".green(), action);
        }
    }
    for skipped in &report.skipped {
        println!("   {} {}", "-".yellow(), skipped.dimmed());
    }
    if report.dry_run {
        println!("{} dry run, nothing was changed", "note:".yellow().bold());
    } else {
        println!("{} {}", "OK".green().bold(), state_label(report.state));
    }
}
