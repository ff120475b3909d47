//! Integration tests for cross-thread use of `CowTree`.
//!
//! These tests verify that with the `arc` feature enabled, clones can
//! be handed to independent threads and mutated there without the
//! parent observing anything, and that read-only sharing behaves.

#![cfg(feature = "arc")]

use std::sync::Arc;
use std::thread;

use cowtree::{CowTree, FreeList};
use rstest::rstest;

fn ascending(tree: &CowTree<i32>) -> Vec<i32> {
    let mut out = Vec::new();
    tree.ascend(|item| {
        out.push(*item);
        true
    });
    out
}

// =============================================================================
// Shared Reader Tests
// =============================================================================

#[rstest]
fn test_concurrent_readers_on_shared_tree() {
    let tree: Arc<CowTree<i32>> = Arc::new((0..1000).collect());

    let handles: Vec<_> = (0..4)
        .map(|reader| {
            let shared = Arc::clone(&tree);
            thread::spawn(move || {
                assert_eq!(shared.len(), 1000);
                assert_eq!(shared.min(), Some(&0));
                assert_eq!(shared.max(), Some(&999));
                for key in (reader * 250)..((reader + 1) * 250) {
                    assert!(shared.contains(&key));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

// =============================================================================
// Parallel Writer Tests
// =============================================================================

#[rstest]
fn test_clones_mutated_on_independent_threads() {
    let original: CowTree<i32> = (0..1000).collect();

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            // Each thread writes its own clone with a private pool.
            let mut fork = original.clone_with_free_list(FreeList::new(32));
            thread::spawn(move || {
                for value in 0..1000 {
                    if value % 4 == writer {
                        fork.delete(&value);
                    }
                }
                fork.replace_or_insert(10_000 + writer);
                fork
            })
        })
        .collect();

    let forks: Vec<CowTree<i32>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("Thread panicked"))
        .collect();

    // The original never moved.
    assert_eq!(ascending(&original), (0..1000).collect::<Vec<_>>());

    // Each fork holds exactly its own edit.
    for (writer, fork) in (0_i32..).zip(&forks) {
        assert_eq!(fork.len(), 751);
        assert!(fork.contains(&(10_000 + writer)));
        for value in 0..1000 {
            assert_eq!(fork.contains(&value), value % 4 != writer);
        }
    }
}

#[rstest]
fn test_fork_chain_across_threads() {
    let mut current: CowTree<i32> = CowTree::new(4);
    current.extend(0..100);

    let mut handles = Vec::new();
    for generation in 0..4 {
        let mut fork = current.clone_with_free_list(FreeList::new(16));
        handles.push(thread::spawn(move || {
            fork.extend(1000 * (generation + 1)..1000 * (generation + 1) + 50);
            (generation, fork)
        }));
        current.extend((generation + 1) * 100..(generation + 2) * 100);
    }

    for handle in handles {
        let (generation, fork) = handle.join().expect("Thread panicked");
        // Each fork saw its generation's prefix plus its own batch.
        let mut expected: Vec<i32> = (0..(generation + 1) * 100).collect();
        expected.extend(1000 * (generation + 1)..1000 * (generation + 1) + 50);
        assert_eq!(ascending(&fork), expected);
    }

    assert_eq!(ascending(&current), (0..500).collect::<Vec<_>>());
}
