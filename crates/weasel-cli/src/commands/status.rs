//! Status command implementation

use std::path::Path;

use colored::Colorize;
use weasel_core::{Drift, SettingsOverrides, StatusReport};
use weasel_git::{ChangeSet, CommitInfo};

use super::{Session, state_label};
use crate::error::Result;

/// Run the status command
pub fn run_status(cwd: &Path, overrides: SettingsOverrides, json: bool) -> Result<()> {
    let mut session = Session::open(cwd, overrides)?;
    let (reconciler, invocation) = session.reconciler();
    let report = reconciler.status(invocation)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_status(&report);
    }
    Ok(())
}

fn print_status(report: &StatusReport) {
    println!("{}", "Link Status".bold());
    println!();
    println!("{}: {}", "Identity".dimmed(), report.identity.cyan());
    println!("{}:     {} ({})", "Here".dimmed(), report.location, report.side);
    println!("{}:    {}", "State".dimmed(), state_label(report.state));

    let Some(record) = &report.record else {
        println!();
        println!("Run {} from the primary location to link it.", "weaseltree clone".cyan());
        return;
    };

    println!("{}:   {}", "Branch".dimmed(), record.branch);
    println!();
    println!("{}:  {}", "Primary".dimmed(), record.primary_location);
    print_commit(report.primary_commit.as_ref());
    println!("{}:   {}", "Mirror".dimmed(), record.mirror_location);
    print_commit(report.mirror_commit.as_ref());

    let Some(drift) = &report.drift else {
        return;
    };
    println!();
    println!("{}:    {}", "Drift".dimmed(), drift_label(drift.drift));
    if drift.branch_changed()
        && let Some(branch) = &drift.mirror_branch
    {
        println!(
            "  {} mirror is on {}; the next sync will adopt it",
            "!".yellow(),
            branch.cyan()
        );
    }
    print_changes("primary", &drift.primary_changes);
    print_changes("mirror", &drift.mirror_changes);
}

fn print_commit(commit: Option<&CommitInfo>) {
    if let Some(commit) = commit {
        println!(
            "          {} {} {}",
            commit.id.short().yellow(),
            commit.message,
            format!("({}, {})", commit.author, commit.timestamp.format("%Y-%m-%d %H:%M")).dimmed()
        );
    }
}

fn print_changes(side: &str, changes: &ChangeSet) {
    if changes.is_empty() {
        return;
    }
    println!(
        "  {} {} changed at the {}",
        "~".yellow(),
        changes.all_paths().len(),
        side
    );
    for path in &changes.modified {
        println!("    {} {}", "M".yellow(), path);
    }
    for path in &changes.added {
        println!("    {} {}", "A".green(), path);
    }
    for path in &changes.deleted {
        println!("    {} {}", "D".red(), path);
    }
    for path in &changes.untracked {
        println!("    {} {}", "?".dimmed(), path);
    }
}

fn drift_label(drift: Drift) -> colored::ColoredString {
    match drift {
        Drift::InSync => "in sync".green(),
        Drift::PrimaryBehind => "primary behind (run sync)".yellow(),
        Drift::MirrorBehind => "mirror behind".red(),
        Drift::Diverged => "diverged".red().bold(),
        Drift::DirtyPrimary => "uncommitted changes at the primary".yellow(),
        Drift::DirtyMirror => "uncommitted changes at the mirror (run up)".yellow(),
    }
}
