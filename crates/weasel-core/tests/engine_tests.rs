//! Tests for the Reconciler against real repositories
//!
//! The bridge context runs plain `git` so the tests work on any host.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use weasel_core::{
    CloneOptions, IdentityResolver, Invocation, LinkRegistry, LinkState, OperationReport,
    Reconciler, Result, Settings, StatusReport,
};
use weasel_fs::NormalizedPath;
use weasel_git::{BridgeGit, NativeGit, Side, Vcs};
use weasel_test_utils::git::{branch, commit_file, git, head};
use weasel_test_utils::repo::LinkedPair;

struct Harness {
    pair: LinkedPair,
    settings: Settings,
    resolver: IdentityResolver,
    vcs: Vcs,
}

impl Harness {
    fn new() -> Self {
        let pair = LinkedPair::new();
        let slow_root = pair.root().join("slow");
        let settings = Settings {
            registry_path: pair.registry(),
            mirror_root: pair.mirror_root(),
            bridge_git: "git".to_string(),
            remote: "origin".to_string(),
            primary_patterns: vec![format!(
                "^{}/(.+)$",
                regex::escape(&slow_root.to_string_lossy())
            )],
        };
        let resolver = IdentityResolver::from_settings(&settings).unwrap();
        let vcs = Vcs::new(Box::new(NativeGit::new()), Box::new(BridgeGit::new("git")));
        Self {
            pair,
            settings,
            resolver,
            vcs,
        }
    }

    fn registry(&self) -> LinkRegistry {
        LinkRegistry::load(&self.settings.registry_path).unwrap()
    }

    fn at(&self, cwd: &Path) -> Invocation {
        self.resolver.resolve(cwd, &self.registry()).unwrap()
    }

    fn primary(&self) -> Invocation {
        self.at(&self.pair.primary())
    }

    fn mirror(&self) -> Invocation {
        self.at(&self.pair.mirror())
    }

    fn with_vcs<T>(&self, vcs: &Vcs, op: impl FnOnce(&mut Reconciler<'_>) -> T) -> T {
        let mut registry = self.registry();
        let mut reconciler = Reconciler::new(&mut registry, vcs, &self.resolver, &self.settings);
        op(&mut reconciler)
    }

    fn run<T>(&self, op: impl FnOnce(&mut Reconciler<'_>) -> T) -> T {
        self.with_vcs(&self.vcs, op)
    }

    fn clone_default(&self) -> Result<OperationReport> {
        let invocation = self.primary();
        self.run(|r| r.clone(&invocation, CloneOptions::default()))
    }

    fn linked() -> Self {
        let harness = Self::new();
        harness.clone_default().unwrap();
        harness
    }

    fn status(&self) -> StatusReport {
        let invocation = self.mirror();
        self.run(|r| r.status(&invocation)).unwrap()
    }
}

// clone

#[test]
fn test_clone_creates_linked_worktree() {
    let h = Harness::new();
    let original_head = head(&h.pair.primary());

    let report = h.clone_default().unwrap();

    assert_eq!(report.state, LinkState::LinkedClean);
    assert_eq!(branch(&h.pair.primary()), None);
    assert_eq!(branch(&h.pair.mirror()), Some("main".to_string()));
    assert_eq!(head(&h.pair.mirror()), original_head);
    assert_eq!(head(&h.pair.primary()), original_head);

    let registry = h.registry();
    let record = registry.lookup("foo").unwrap();
    assert_eq!(record.branch, "main");
    assert_eq!(record.primary_location, NormalizedPath::new(h.pair.primary()));
    assert_eq!(record.mirror_location, NormalizedPath::new(h.pair.mirror()));
}

#[test]
fn test_mirror_is_recognized_after_clone() {
    let h = Harness::linked();

    let invocation = h.at(&h.pair.mirror().join("."));
    assert_eq!(invocation.identity, "foo");
    assert_eq!(invocation.side, Side::Mirror);
}

#[test]
fn test_clone_twice_requires_force() {
    let h = Harness::linked();

    let err = h.clone_default().unwrap_err();
    assert_eq!(err.category(), "PreconditionError");

    // With force the existing mirror is adopted as-is
    let invocation = h.primary();
    let report = h
        .run(|r| {
            r.clone(
                &invocation,
                CloneOptions {
                    force: true,
                    ..Default::default()
                },
            )
        })
        .unwrap();
    assert_eq!(report.state, LinkState::LinkedClean);
    assert_eq!(h.registry().lookup("foo").unwrap().branch, "main");
}

#[test]
fn test_clone_from_mirror_is_refused() {
    let h = Harness::linked();
    let invocation = h.mirror();

    let err = h
        .run(|r| {
            r.clone(
                &invocation,
                CloneOptions {
                    force: true,
                    ..Default::default()
                },
            )
        })
        .unwrap_err();
    assert_eq!(err.category(), "PreconditionError");
}

#[test]
fn test_clone_refuses_detached_primary() {
    let h = Harness::new();
    git(&h.pair.primary(), &["checkout", "--detach"]);

    let err = h.clone_default().unwrap_err();

    assert_eq!(err.category(), "PreconditionError");
    assert!(h.registry().get("foo").is_none());
    assert!(!h.pair.mirror().exists());
}

#[test]
fn test_clone_refuses_tracked_changes() {
    let h = Harness::new();
    h.pair.write_primary("README.md", "uncommitted");

    let err = h.clone_default().unwrap_err();

    assert_eq!(err.category(), "PreconditionError");
    assert_eq!(branch(&h.pair.primary()), Some("main".to_string()));
    assert!(!h.pair.mirror().exists());
}

#[test]
fn test_clone_reattaches_primary_when_worktree_creation_fails() {
    let h = Harness::new();
    let blocker = h.pair.root().join("blocker");
    fs::write(&blocker, "a file where a directory should be").unwrap();
    let invocation = h.primary();

    let err = h
        .run(|r| {
            r.clone(
                &invocation,
                CloneOptions {
                    target: Some(NormalizedPath::new(blocker.join("foo"))),
                    force: false,
                },
            )
        })
        .unwrap_err();

    assert_ne!(err.category(), "PreconditionError");
    assert_eq!(branch(&h.pair.primary()), Some("main".to_string()));
    assert!(h.registry().get("foo").is_none());
}

#[test]
fn test_clone_refuses_foreign_target() {
    let h = Harness::new();
    h.pair.write_mirror("unrelated.txt", "not a worktree");

    let err = h.clone_default().unwrap_err();

    assert_eq!(err.category(), "PreconditionError");
    assert_eq!(branch(&h.pair.primary()), Some("main".to_string()));
}

// sync

#[test]
fn test_sync_advances_primary_to_mirror_head() {
    let h = Harness::linked();
    let new_head = commit_file(&h.pair.mirror(), "src/lib.rs", "pub fn f() {}\n", "add lib");

    let report = h.run(|r| r.sync(&h.mirror())).unwrap();

    assert_eq!(head(&h.pair.primary()), new_head);
    assert_eq!(branch(&h.pair.primary()), None);
    assert_eq!(h.pair.read_primary("src/lib.rs").unwrap(), "pub fn f() {}\n");
    assert_eq!(report.state, LinkState::LinkedClean);
}

#[test]
fn test_sync_with_equal_heads_is_noop() {
    let h = Harness::linked();

    let report = h.run(|r| r.sync(&h.primary())).unwrap();

    assert!(report.is_noop());
}

#[test]
fn test_sync_refuses_diverged_primary() {
    let h = Harness::linked();
    let stray = commit_file(&h.pair.primary(), "stray.txt", "slow side commit", "stray");
    commit_file(&h.pair.mirror(), "a.txt", "a", "mirror work");

    let err = h.run(|r| r.sync(&h.mirror())).unwrap_err();

    assert_eq!(err.category(), "DivergedError");
    assert_eq!(head(&h.pair.primary()), stray);
}

#[test]
fn test_sync_refuses_conflicting_primary_edits() {
    let h = Harness::linked();
    let before = head(&h.pair.primary());
    commit_file(&h.pair.mirror(), "README.md", "# Mirror\n", "edit readme");
    h.pair.write_primary("README.md", "# Primary\n");

    let err = h.run(|r| r.sync(&h.mirror())).unwrap_err();

    assert_eq!(err.category(), "PreconditionError");
    assert!(err.to_string().contains("README.md"));
    assert_eq!(head(&h.pair.primary()), before);
    assert_eq!(h.pair.read_primary("README.md").unwrap(), "# Primary\n");
}

#[test]
fn test_sync_carries_changes_already_copied_up() {
    let h = Harness::linked();
    h.pair.write_mirror("README.md", "# Edited\n");
    h.pair.write_mirror("notes.txt", "new file\n");
    h.run(|r| r.up(&h.mirror(), false)).unwrap();
    git(&h.pair.mirror(), &["add", "-A"]);
    git(&h.pair.mirror(), &["commit", "-m", "edits"]);

    h.run(|r| r.sync(&h.mirror())).unwrap();

    assert_eq!(head(&h.pair.primary()), head(&h.pair.mirror()));
    assert_eq!(git(&h.pair.primary(), &["status", "--porcelain"]), "");
    assert_eq!(h.status().state, LinkState::LinkedClean);
}

#[test]
fn test_sync_adopts_new_mirror_branch() {
    let h = Harness::linked();
    git(&h.pair.mirror(), &["checkout", "-b", "feature"]);
    let feature_head = commit_file(&h.pair.mirror(), "f.txt", "feature", "feature work");

    let report = h.run(|r| r.sync(&h.mirror())).unwrap();

    assert!(report.actions.iter().any(|a| a.contains("adopted branch 'feature'")));
    assert_eq!(h.registry().lookup("foo").unwrap().branch, "feature");
    assert_eq!(head(&h.pair.primary()), feature_head);
}

#[test]
fn test_sync_follows_mirror_back_to_older_branch() {
    let h = Harness::linked();
    let main_head = head(&h.pair.mirror());
    git(&h.pair.mirror(), &["checkout", "-b", "feature"]);
    let feature_head = commit_file(&h.pair.mirror(), "f.txt", "feature", "feature work");
    h.run(|r| r.sync(&h.mirror())).unwrap();
    assert_eq!(head(&h.pair.primary()), feature_head);

    git(&h.pair.mirror(), &["checkout", "main"]);
    let report = h.run(|r| r.sync(&h.mirror())).unwrap();

    assert!(report.actions.iter().any(|a| a.contains("kept on 'feature'")));
    assert_eq!(h.registry().lookup("foo").unwrap().branch, "main");
    assert_eq!(head(&h.pair.primary()), main_head);
    assert_eq!(branch(&h.pair.primary()), None);
    assert!(!h.pair.primary().join("f.txt").exists());
    assert_eq!(git(&h.pair.mirror(), &["rev-parse", "refs/heads/feature"]), feature_head);
    assert_eq!(h.status().state, LinkState::LinkedClean);
}

#[test]
fn test_sync_still_refuses_primary_commit_after_branch_switch() {
    let h = Harness::linked();
    git(&h.pair.mirror(), &["checkout", "-b", "feature"]);
    commit_file(&h.pair.mirror(), "f.txt", "feature", "feature work");
    h.run(|r| r.sync(&h.mirror())).unwrap();
    let stray = commit_file(&h.pair.primary(), "stray.txt", "slow side", "stray");

    git(&h.pair.mirror(), &["checkout", "main"]);
    let err = h.run(|r| r.sync(&h.mirror())).unwrap_err();

    assert_eq!(err.category(), "DivergedError");
    assert_eq!(head(&h.pair.primary()), stray);
}

#[test]
fn test_sync_without_record_is_not_found() {
    let h = Harness::new();

    let err = h.run(|r| r.sync(&h.primary())).unwrap_err();

    assert_eq!(err.category(), "NotFound");
}

#[test]
fn test_sync_requires_mirror_on_branch() {
    let h = Harness::linked();
    git(&h.pair.mirror(), &["checkout", "--detach"]);

    let err = h.run(|r| r.sync(&h.mirror())).unwrap_err();

    assert_eq!(err.category(), "PreconditionError");
}

#[test]
fn test_missing_mirror_fails_validation() {
    let h = Harness::linked();
    let invocation = h.primary();
    fs::remove_dir_all(h.pair.mirror()).unwrap();

    let err = h.run(|r| r.sync(&invocation)).unwrap_err();

    assert_eq!(err.category(), "PreconditionError");
}

// up

#[test]
fn test_up_copies_changes_and_never_deletes() {
    let h = Harness::linked();
    commit_file(&h.pair.mirror(), "old.txt", "old", "add old");
    h.run(|r| r.sync(&h.mirror())).unwrap();

    h.pair.write_mirror("README.md", "# Changed\n");
    h.pair.write_mirror("deep/new/file.rs", "fn x() {}\n");
    fs::remove_file(h.pair.mirror().join("old.txt")).unwrap();

    let report = h.run(|r| r.up(&h.mirror(), false)).unwrap();

    assert_eq!(
        report.actions,
        vec!["copied README.md".to_string(), "copied deep/new/file.rs".to_string()]
    );
    assert_eq!(report.skipped, vec!["old.txt".to_string()]);
    assert_eq!(h.pair.read_primary("README.md").unwrap(), "# Changed\n");
    assert_eq!(h.pair.read_primary("deep/new/file.rs").unwrap(), "fn x() {}\n");
    assert_eq!(h.pair.read_primary("old.txt").unwrap(), "old");
}

#[test]
fn test_up_is_idempotent() {
    let h = Harness::linked();
    h.pair.write_mirror("README.md", "# Changed\n");

    let first = h.run(|r| r.up(&h.mirror(), false)).unwrap();
    let second = h.run(|r| r.up(&h.mirror(), false)).unwrap();

    assert_eq!(first.actions.len(), 1);
    assert!(second.is_noop());
}

#[test]
fn test_up_dry_run_writes_nothing() {
    let h = Harness::linked();
    h.pair.write_mirror("README.md", "# Changed\n");

    let report = h.run(|r| r.up(&h.mirror(), true)).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.actions, vec!["would copy README.md".to_string()]);
    assert_eq!(h.pair.read_primary("README.md").unwrap(), "# Test\n");
}

// push / pull

#[test]
fn test_push_publishes_mirror_branch() {
    let h = Harness::linked();
    let local = commit_file(&h.pair.mirror(), "a.txt", "a", "local work");

    h.run(|r| r.push(&h.mirror())).unwrap();

    assert_eq!(git(&h.pair.remote(), &["rev-parse", "main"]), local);
}

#[test]
fn test_network_steps_use_bridge_context() {
    let h = Harness::linked();
    git(&h.pair.mirror(), &["checkout", "-b", "topic"]);
    let broken = Vcs::new(
        Box::new(NativeGit::new()),
        Box::new(BridgeGit::new("weaseltree-missing-bridge-git")),
    );

    let push = h.with_vcs(&broken, |r| r.push(&h.mirror())).unwrap_err();
    let pull = h.with_vcs(&broken, |r| r.pull(&h.mirror())).unwrap_err();

    assert_eq!(push.category(), "EnvironmentError");
    assert_eq!(pull.category(), "EnvironmentError");
    // The adopted branch is not persisted by a failed operation
    assert_eq!(h.registry().lookup("foo").unwrap().branch, "main");
}

#[test]
fn test_pull_fast_forwards_mirror() {
    let h = Harness::linked();
    let other = h.pair.collaborator();
    let upstream = commit_file(&other, "theirs.txt", "theirs", "upstream");
    git(&other, &["push", "origin", "main"]);

    let report = h.run(|r| r.pull(&h.primary())).unwrap();

    assert_eq!(head(&h.pair.mirror()), upstream);
    // The primary only moves on sync
    assert_eq!(report.state, LinkState::LinkedDirty);
}

#[test]
fn test_pull_refuses_non_fast_forward() {
    let h = Harness::linked();
    let other = h.pair.collaborator();
    commit_file(&other, "theirs.txt", "theirs", "upstream");
    git(&other, &["push", "origin", "main"]);
    let local = commit_file(&h.pair.mirror(), "mine.txt", "mine", "local");

    let err = h.run(|r| r.pull(&h.mirror())).unwrap_err();

    assert_eq!(err.category(), "DivergedError");
    assert_eq!(head(&h.pair.mirror()), local);
}

// status

#[test]
fn test_status_of_unlinked_primary() {
    let h = Harness::new();
    let invocation = h.primary();

    let status = h.run(|r| r.status(&invocation)).unwrap();

    assert_eq!(status.state, LinkState::Unlinked);
    assert!(status.record.is_none());
}

#[test]
fn test_status_reports_primary_behind_after_mirror_commit() {
    let h = Harness::linked();
    commit_file(&h.pair.mirror(), "a.txt", "a", "mirror work");

    let status = h.status();

    assert_eq!(status.state, LinkState::LinkedDirty);
    let drift = status.drift.unwrap();
    assert_eq!(drift.drift, weasel_core::Drift::PrimaryBehind);
    assert_eq!(status.mirror_commit.unwrap().message, "mirror work");
}
