//! Link registry
//!
//! The durable map from repository identity to its recorded link. Stored as
//! TOML in the host home so both sides of a WSL setup see the same file:
//!
//! ```toml
//! version = "1"
//!
//! [links."r/foo"]
//! branch = "main"
//! primary_location = "/mnt/c/r/foo"
//! mirror_location = "/home/me/r/foo"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use weasel_fs::{ConfigStore, NormalizedPath};

use crate::{Error, Result};

const REGISTRY_VERSION: &str = "1";

const REGISTRY_HEADER: &str = "weaseltree link registry, shared by both sides of every link.\nRewritten by `weaseltree clone`, `sync`, `push` and `pull`.";

/// The recorded association between one repository's two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// Path-derived key, e.g. `r/foo`
    pub identity: String,
    /// Branch the mirror tracks
    pub branch: String,
    /// Slow-side checkout, detached after linking
    pub primary_location: NormalizedPath,
    /// Fast-side linked worktree
    pub mirror_location: NormalizedPath,
}

impl LinkRecord {
    /// Location for the given side.
    pub fn location(&self, side: weasel_git::Side) -> &NormalizedPath {
        match side {
            weasel_git::Side::Primary => &self.primary_location,
            weasel_git::Side::Mirror => &self.mirror_location,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinkEntry {
    branch: String,
    primary_location: NormalizedPath,
    mirror_location: NormalizedPath,
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    version: String,
    #[serde(default)]
    links: BTreeMap<String, LinkEntry>,
}

/// In-memory view of the registry file.
///
/// Loaded once per invocation; changes stay in memory until [`save`]
/// is called after an operation succeeds.
///
/// [`save`]: LinkRegistry::save
#[derive(Debug)]
pub struct LinkRegistry {
    path: NormalizedPath,
    links: BTreeMap<String, LinkRecord>,
    dirty: bool,
}

impl LinkRegistry {
    /// An empty registry that will be written to `path`.
    pub fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: NormalizedPath::new(path),
            links: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Load the registry, treating a missing file as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// carries an unknown format version.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut registry = Self::empty(path);
        let Some(file) = ConfigStore::new().load_optional::<RegistryFile>(&registry.path)? else {
            tracing::debug!(path = %registry.path, "no registry yet");
            return Ok(registry);
        };

        if file.version != REGISTRY_VERSION {
            return Err(Error::Config(format!(
                "unsupported registry version '{}' in {}",
                file.version, registry.path
            )));
        }

        registry.links = file
            .links
            .into_iter()
            .map(|(identity, entry)| {
                let record = LinkRecord {
                    identity: identity.clone(),
                    branch: entry.branch,
                    primary_location: entry.primary_location,
                    mirror_location: entry.mirror_location,
                };
                (identity, record)
            })
            .collect();
        tracing::debug!(path = %registry.path, links = registry.links.len(), "loaded registry");
        Ok(registry)
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Record for `identity`, failing with `NotFound`.
    pub fn lookup(&self, identity: &str) -> Result<&LinkRecord> {
        self.get(identity).ok_or_else(|| Error::NotFound {
            identity: identity.to_string(),
        })
    }

    pub fn get(&self, identity: &str) -> Option<&LinkRecord> {
        self.links.get(identity)
    }

    /// Insert or replace the record for its identity.
    pub fn upsert(&mut self, record: LinkRecord) {
        if self.links.get(&record.identity) != Some(&record) {
            self.links.insert(record.identity.clone(), record);
            self.dirty = true;
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.values()
    }

    /// Record whose primary or mirror location contains `path`, with the
    /// matching side. The longest matching location wins.
    pub fn find_by_location(&self, path: &NormalizedPath) -> Option<(&LinkRecord, weasel_git::Side)> {
        self.links
            .values()
            .flat_map(|record| {
                [weasel_git::Side::Primary, weasel_git::Side::Mirror]
                    .into_iter()
                    .map(move |side| (record, side))
            })
            .filter(|(record, side)| path.starts_with(record.location(*side)))
            .max_by_key(|(record, side)| record.location(*side).as_str().len())
    }

    /// Whether there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the registry atomically if it changed since loading.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let file = RegistryFile {
            version: REGISTRY_VERSION.to_string(),
            links: self
                .links
                .iter()
                .map(|(identity, record)| {
                    let entry = LinkEntry {
                        branch: record.branch.clone(),
                        primary_location: record.primary_location.clone(),
                        mirror_location: record.mirror_location.clone(),
                    };
                    (identity.clone(), entry)
                })
                .collect(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent.to_native()).map_err(|e| Error::io(parent.to_native(), e))?;
        }
        ConfigStore::new()
            .with_header(REGISTRY_HEADER)
            .save(&self.path, &file)?;
        self.dirty = false;
        tracing::debug!(path = %self.path, "saved registry");
        Ok(())
    }
}
