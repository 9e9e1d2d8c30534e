//! weaseltree CLI
//!
//! Keeps a checkout on a slow mount and a linked worktree on a fast
//! filesystem pointed at the same commits.

mod cli;
mod commands;
mod error;
mod logging;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use weasel_core::SettingsOverrides;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}: {}: {}", "error".red().bold(), e.category(), one_line(&e.to_string()));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let overrides: SettingsOverrides = cli.settings.into();
    let command = cli.command.unwrap_or(Commands::Status { json: false });

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "weaseltree", &mut std::io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    match command {
        Commands::Status { json } => commands::run_status(&cwd, overrides, json),
        Commands::Clone { target, force } => commands::run_clone(&cwd, overrides, target, force),
        Commands::Sync => commands::run_sync(&cwd, overrides),
        Commands::Up { dry_run } => commands::run_up(&cwd, overrides, dry_run),
        Commands::Push => commands::run_push(&cwd, overrides),
        Commands::Pull => commands::run_pull(&cwd, overrides),
        Commands::Completions { .. } => Ok(()),
    }
}

/// Collapse tool output spanning several lines into one.
fn one_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
