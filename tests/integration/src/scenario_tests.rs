//! Whole-lifecycle scenarios over a real primary, mirror and remote.

mod world;

use std::fs;

use pretty_assertions::assert_eq;
use weasel_core::{Drift, LinkState, SettingsOverrides};
use weasel_git::Side;
use weasel_test_utils::git::{branch, commit_file, git, head};
use world::World;

// =============================================================================
// Clone
// =============================================================================

#[test]
fn scenario_clone_detaches_primary_and_creates_mirror() {
    let world = World::new();
    let before = head(&world.pair.primary());

    let report = world.clone_from(&world.pair.primary()).unwrap();

    assert_eq!(report.state, LinkState::LinkedClean);
    assert_eq!(branch(&world.pair.primary()), None);
    assert_eq!(branch(&world.pair.mirror()), Some("main".to_string()));
    assert_eq!(head(&world.pair.mirror()), before);

    let record = world.registry().lookup("foo").unwrap().clone();
    assert_eq!(record.branch, "main");
    assert_eq!(
        git(&world.pair.mirror(), &["rev-parse", "--path-format=absolute", "--git-common-dir"]),
        git(&world.pair.primary(), &["rev-parse", "--path-format=absolute", "--git-common-dir"])
    );
}

#[test]
fn scenario_mirror_and_primary_resolve_to_the_same_identity() {
    let world = World::linked();
    fs::create_dir_all(world.pair.mirror().join("src/deep")).unwrap();

    let from_primary = world.at(&world.pair.primary());
    let from_mirror = world.at(&world.pair.mirror().join("src/deep"));

    assert_eq!(from_primary.identity, from_mirror.identity);
    assert_eq!(from_primary.side, Side::Primary);
    assert_eq!(from_mirror.side, Side::Mirror);
}

// =============================================================================
// Up
// =============================================================================

#[test]
fn scenario_up_copies_edit_without_committing() {
    let world = World::linked();
    let primary_head = head(&world.pair.primary());
    world.pair.write_mirror("x.txt", "edited on the fast side\n");

    let report = world.up().unwrap();

    assert_eq!(report.actions, vec!["copied x.txt".to_string()]);
    assert_eq!(
        world.pair.read_primary("x.txt").as_deref(),
        Some("edited on the fast side\n")
    );
    assert_eq!(branch(&world.pair.primary()), None);
    assert_eq!(head(&world.pair.primary()), primary_head);
}

#[test]
fn scenario_up_never_deletes_at_primary() {
    let world = World::linked();
    fs::remove_file(world.mirror_file("README.md")).unwrap();

    let report = world.up().unwrap();

    assert!(world.pair.primary().join("README.md").exists());
    assert!(report.skipped.iter().any(|s| s.contains("README.md")));
}

// =============================================================================
// Sync
// =============================================================================

#[test]
fn scenario_sync_after_fast_commit() {
    let world = World::linked();
    let new_head = commit_file(&world.pair.mirror(), "x.txt", "committed\n", "Add x");

    let report = world.sync().unwrap();

    assert!(!report.is_noop());
    assert_eq!(head(&world.pair.primary()), new_head);
    assert_eq!(branch(&world.pair.primary()), None);
    assert_eq!(world.pair.read_primary("x.txt").as_deref(), Some("committed\n"));
    assert_eq!(report.state, LinkState::LinkedClean);
}

#[test]
fn scenario_up_commit_sync_leaves_link_clean() {
    let world = World::linked();
    world.pair.write_mirror("x.txt", "work in progress\n");
    world.up().unwrap();

    let new_head = commit_file(&world.pair.mirror(), "x.txt", "work in progress\n", "Finish x");
    world.sync().unwrap();

    assert_eq!(head(&world.pair.primary()), new_head);
    let status = world.status(&world.pair.primary());
    assert_eq!(status.state, LinkState::LinkedClean);
    assert_eq!(status.drift.unwrap().drift, Drift::InSync);
}

#[test]
fn scenario_sync_refuses_commit_made_at_primary() {
    let world = World::linked();
    let primary_head = commit_file(&world.pair.primary(), "slow.txt", "slow\n", "Slow side");
    commit_file(&world.pair.mirror(), "fast.txt", "fast\n", "Fast side");
    let registry_before = world.registry_bytes();

    let err = world.sync().unwrap_err();

    assert_eq!(err.category(), "DivergedError");
    assert_eq!(head(&world.pair.primary()), primary_head);
    assert!(world.pair.primary().join("slow.txt").exists());
    assert!(!world.pair.primary().join("fast.txt").exists());
    assert_eq!(world.registry_bytes(), registry_before);
}

#[test]
fn scenario_sync_adopts_new_fast_side_branch() {
    let world = World::linked();
    git(&world.pair.mirror(), &["checkout", "-b", "feature"]);
    let feature_head = commit_file(&world.pair.mirror(), "f.txt", "f\n", "Feature");

    let report = world.sync().unwrap();

    assert!(report.actions.iter().any(|a| a.contains("feature")));
    assert_eq!(world.registry().lookup("foo").unwrap().branch, "feature");
    assert_eq!(head(&world.pair.primary()), feature_head);
}

// =============================================================================
// Push / Pull
// =============================================================================

#[test]
fn scenario_round_trip_with_collaborator() {
    let world = World::linked();
    let ours = commit_file(&world.pair.mirror(), "ours.txt", "ours\n", "Ours");
    world.sync().unwrap();
    world.push().unwrap();
    assert_eq!(git(&world.pair.remote(), &["rev-parse", "refs/heads/main"]), ours);

    let other = world.pair.collaborator();
    git(&other, &["pull", "--ff-only", "origin", "main"]);
    let theirs = commit_file(&other, "theirs.txt", "theirs\n", "Theirs");
    git(&other, &["push", "origin", "main"]);

    world.pull().unwrap();
    assert_eq!(head(&world.pair.mirror()), theirs);
    assert_eq!(world.status(&world.pair.mirror()).drift.unwrap().drift, Drift::PrimaryBehind);

    world.sync().unwrap();
    assert_eq!(head(&world.pair.primary()), theirs);
    assert_eq!(world.status(&world.pair.primary()).state, LinkState::LinkedClean);
}

#[test]
fn scenario_network_steps_go_through_bridge() {
    let world = World::with_overrides(SettingsOverrides {
        bridge_git: Some("weaseltree-no-such-git".to_string()),
        ..Default::default()
    });
    // Clone's own git steps at the primary also use the bridge, so link by hand.
    world.pair.link();
    let mut registry = world.registry();
    registry.upsert(weasel_core::LinkRecord {
        identity: "foo".to_string(),
        branch: "main".to_string(),
        primary_location: weasel_fs::NormalizedPath::new(world.pair.primary()),
        mirror_location: weasel_fs::NormalizedPath::new(world.pair.mirror()),
    });
    registry.save().unwrap();
    commit_file(&world.pair.mirror(), "x.txt", "x\n", "X");
    let remote_before = git(&world.pair.remote(), &["rev-parse", "refs/heads/main"]);

    let push = world.push().unwrap_err();
    let pull = world.pull().unwrap_err();

    assert_eq!(push.category(), "EnvironmentError");
    assert_eq!(pull.category(), "EnvironmentError");
    assert_eq!(git(&world.pair.remote(), &["rev-parse", "refs/heads/main"]), remote_before);
}
