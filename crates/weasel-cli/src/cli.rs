//! CLI argument parsing using clap derive macros

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use weasel_core::SettingsOverrides;

/// Keep a slow-mount checkout and its fast-filesystem worktree in sync
#[derive(Parser, Debug)]
#[command(name = "weaseltree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: GlobalSettings,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags that override the settings file and environment.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalSettings {
    /// Link registry file
    #[arg(long, global = true, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Git binary used at the slow-side location
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub bridge_git: Option<String>,

    /// Directory under which mirrors are created by default
    #[arg(long, global = true, value_name = "DIR")]
    pub mirror_root: Option<PathBuf>,

    /// Remote used by push and pull
    #[arg(long, global = true, value_name = "NAME")]
    pub remote: Option<String>,
}

impl From<GlobalSettings> for SettingsOverrides {
    fn from(g: GlobalSettings) -> Self {
        Self {
            registry_path: g.registry,
            mirror_root: g.mirror_root,
            bridge_git: g.bridge_git,
            remote: g.remote,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show how the two locations of this repository relate (default)
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the fast-side worktree for the current slow-side checkout
    Clone {
        /// Where to create the worktree (defaults to the mirror root)
        target: Option<PathBuf>,

        /// Re-link even if this repository is already registered
        #[arg(short, long)]
        force: bool,
    },

    /// Move the slow-side checkout to the fast side's commit
    Sync,

    /// Copy uncommitted fast-side changes to the slow side
    Up {
        /// Show what would be copied without copying
        #[arg(long)]
        dry_run: bool,
    },

    /// Push the branch through the slow-side git
    Push,

    /// Fetch through the slow-side git and fast-forward the fast side
    Pull,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
