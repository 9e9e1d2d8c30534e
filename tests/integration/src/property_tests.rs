//! Properties checked against real repositories with generated edits.
//!
//! Each case builds a fresh linked pair, so the case counts stay small.

mod world;

use std::collections::BTreeMap;

use proptest::prelude::*;
use weasel_test_utils::git::{branch, head};
use world::World;

fn edits() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,6}(/[a-z]{1,6})?\\.txt", "[a-zA-Z0-9 ]{0,24}", 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn up_is_idempotent_and_leaves_history_alone(files in edits()) {
        let world = World::linked();
        let primary_head = head(&world.pair.primary());
        for (path, content) in &files {
            world.pair.write_mirror(path, content);
        }

        let first = world.up().unwrap();
        let second = world.up().unwrap();

        prop_assert!(!first.is_noop());
        prop_assert!(second.is_noop(), "second up copied {:?}", second.actions);
        for (path, content) in &files {
            let actual = world.pair.read_primary(path);
            prop_assert_eq!(actual.as_deref(), Some(content.as_str()));
        }
        prop_assert_eq!(head(&world.pair.primary()), primary_head);
        prop_assert_eq!(branch(&world.pair.primary()), None);
    }

    #[test]
    fn up_dry_run_reports_without_writing(files in edits()) {
        let world = World::linked();
        for (path, content) in &files {
            world.pair.write_mirror(path, content);
        }

        let report = world.run(&world.pair.mirror(), |r, inv| r.up(inv, true)).unwrap();

        prop_assert!(report.dry_run);
        prop_assert_eq!(report.actions.len(), files.len());
        for path in files.keys() {
            prop_assert!(world.pair.read_primary(path).is_none());
        }
    }
}
