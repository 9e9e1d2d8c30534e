//! Filesystem layer for weaseltree
//!
//! Provides normalized path handling, locked atomic writes, a
//! format-agnostic config store and the working-tree file copier used to
//! carry uncommitted edits from one checkout to the other.

pub mod checksum;
pub mod config;
pub mod copy;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use copy::{CopyReport, copy_paths};
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{NormalizedPath, validate_relative_path};
