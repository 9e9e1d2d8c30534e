//! Repository identity resolution
//!
//! Maps the directory a command was run from to a stable identity (the
//! slow-side path below its drive, e.g. `r/foo`) and tells which side of
//! the link the caller is on.

use std::path::Path;

use regex::Regex;
use serde::Serialize;
use weasel_fs::NormalizedPath;
use weasel_git::Side;

use crate::registry::LinkRegistry;
use crate::{Error, Result, Settings};

/// Where a command was invoked from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub identity: String,
    pub side: Side,
    /// Worktree root containing the working directory
    pub location: NormalizedPath,
}

/// Resolves identities from paths.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    patterns: Vec<Regex>,
    mirror_root: NormalizedPath,
}

impl IdentityResolver {
    /// Build a resolver from primary-path patterns and the mirror root.
    ///
    /// # Errors
    ///
    /// Each pattern must compile and have exactly one capture group.
    pub fn new<S: AsRef<str>>(patterns: &[S], mirror_root: impl AsRef<Path>) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(p.as_ref())?;
                if regex.captures_len() != 2 {
                    return Err(Error::Config(format!(
                        "primary pattern '{}' must have exactly one capture group",
                        p.as_ref()
                    )));
                }
                Ok(regex)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            mirror_root: NormalizedPath::canonical(mirror_root),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.primary_patterns.as_slice(), &settings.mirror_root)
    }

    /// Identity of a slow-side path, if any pattern recognizes it.
    pub fn primary_identity(&self, path: &NormalizedPath) -> Option<String> {
        self.patterns.iter().find_map(|regex| {
            let captured = regex.captures(path.as_str())?.get(1)?.as_str();
            let identity = captured.replace('\\', "/").trim_end_matches('/').to_string();
            (!identity.is_empty()).then_some(identity)
        })
    }

    /// Where the mirror of `identity` goes when no target is given.
    pub fn default_mirror_location(&self, identity: &str) -> NormalizedPath {
        self.mirror_root.join(identity)
    }

    pub fn mirror_root(&self) -> &NormalizedPath {
        &self.mirror_root
    }

    /// Resolve the invocation for `cwd`.
    ///
    /// Registered locations are checked first so mirrors created at an
    /// explicit target are recognized; then the primary patterns; then the
    /// mirror root, which only counts for registered identities.
    pub fn resolve(&self, cwd: &Path, registry: &LinkRegistry) -> Result<Invocation> {
        let location = worktree_root(cwd);
        tracing::debug!(cwd = %cwd.display(), root = %location, "resolving identity");

        if let Some((record, side)) = registry.find_by_location(&location) {
            return Ok(Invocation {
                identity: record.identity.clone(),
                side,
                location: record.location(side).clone(),
            });
        }

        if let Some(identity) = self.primary_identity(&location) {
            return Ok(Invocation {
                identity,
                side: Side::Primary,
                location,
            });
        }

        if let Some(relative) = location.relative_to(&self.mirror_root)
            && !relative.is_empty()
            && registry.get(&relative).is_some()
        {
            return Ok(Invocation {
                identity: relative,
                side: Side::Mirror,
                location,
            });
        }

        Err(Error::Identity {
            path: cwd.to_path_buf(),
        })
    }
}

/// Canonical root of the worktree containing `cwd`, or `cwd` itself when it
/// is not inside one.
fn worktree_root(cwd: &Path) -> NormalizedPath {
    let cwd = NormalizedPath::canonical(cwd);
    match git2::Repository::discover(cwd.to_native()) {
        Ok(repo) => match repo.workdir() {
            Some(workdir) => NormalizedPath::canonical(workdir),
            None => cwd,
        },
        Err(_) => cwd,
    }
}
