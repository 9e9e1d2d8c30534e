//! Shared setup: a [`LinkedPair`] wired through the real settings resolver.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use weasel_core::{
    CloneOptions, IdentityResolver, Invocation, LinkRegistry, OperationReport, Reconciler,
    Result, Settings, SettingsOverrides, SettingsResolver, StatusReport,
};
use weasel_git::Vcs;
use weasel_test_utils::repo::LinkedPair;

pub struct World {
    pub pair: LinkedPair,
    pub settings: Settings,
    resolver: IdentityResolver,
    vcs: Vcs,
}

impl World {
    pub fn new() -> Self {
        Self::with_overrides(SettingsOverrides::default())
    }

    /// Settings come from a config file and environment inside the pair's
    /// temp tree, with `overrides` applied last like command-line flags.
    pub fn with_overrides(overrides: SettingsOverrides) -> Self {
        let pair = LinkedPair::new();
        let config_dir = pair.root().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let slow_root = pair.root().join("slow");
        fs::write(
            config_dir.join("config.toml"),
            format!(
                "primary_patterns = ['^{}/(.+)$']\n",
                regex::escape(&slow_root.to_string_lossy())
            ),
        )
        .unwrap();

        let settings = SettingsResolver::new()
            .with_config_dir(&config_dir)
            .with_home(pair.root().join("home"))
            .with_env([
                ("WEASELTREE_REGISTRY", pair.registry().to_string_lossy().to_string()),
                ("WEASELTREE_MIRROR_ROOT", pair.mirror_root().to_string_lossy().to_string()),
                ("WEASELTREE_BRIDGE_GIT", "git".to_string()),
            ])
            .resolve(overrides)
            .unwrap();
        let resolver = IdentityResolver::from_settings(&settings).unwrap();
        let vcs = weasel_core::vcs_for(&settings);

        Self {
            pair,
            settings,
            resolver,
            vcs,
        }
    }

    pub fn linked() -> Self {
        let world = Self::new();
        world.clone_from(&world.pair.primary()).unwrap();
        world
    }

    pub fn registry(&self) -> LinkRegistry {
        LinkRegistry::load(&self.settings.registry_path).unwrap()
    }

    pub fn at(&self, cwd: &Path) -> Invocation {
        self.resolver.resolve(cwd, &self.registry()).unwrap()
    }

    /// Run one operation the way a single CLI process would: fresh registry,
    /// fresh reconciler.
    pub fn run<T>(&self, cwd: &Path, op: impl FnOnce(&mut Reconciler<'_>, &Invocation) -> T) -> T {
        let invocation = self.at(cwd);
        let mut registry = self.registry();
        let mut reconciler = Reconciler::new(&mut registry, &self.vcs, &self.resolver, &self.settings);
        op(&mut reconciler, &invocation)
    }

    pub fn clone_from(&self, cwd: &Path) -> Result<OperationReport> {
        self.run(cwd, |r, inv| r.clone(inv, CloneOptions::default()))
    }

    pub fn up(&self) -> Result<OperationReport> {
        self.run(&self.pair.mirror(), |r, inv| r.up(inv, false))
    }

    pub fn sync(&self) -> Result<OperationReport> {
        self.run(&self.pair.mirror(), |r, inv| r.sync(inv))
    }

    pub fn push(&self) -> Result<OperationReport> {
        self.run(&self.pair.mirror(), |r, inv| r.push(inv))
    }

    pub fn pull(&self) -> Result<OperationReport> {
        self.run(&self.pair.mirror(), |r, inv| r.pull(inv))
    }

    pub fn status(&self, cwd: &Path) -> StatusReport {
        self.run(cwd, |r, inv| r.status(inv)).unwrap()
    }

    pub fn registry_bytes(&self) -> Vec<u8> {
        fs::read(self.pair.registry()).unwrap()
    }

    pub fn mirror_file(&self, relative: &str) -> PathBuf {
        self.pair.mirror().join(relative)
    }
}
