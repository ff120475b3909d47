//! # cowtree
//!
//! An in-memory B-tree sorted set with O(1) copy-on-write cloning.
//!
//! ## Overview
//!
//! [`CowTree`] stores user-defined items in comparator order inside a
//! B-tree. It behaves like a mutable sorted set: inserting an item that
//! is equivalent to a stored one replaces it and hands the prior item
//! back. On top of the usual point queries and min/max access it offers:
//!
//! - **Predicate-driven ordered traversal**: eight ascend/descend
//!   variants with optional range bounds, each stopping as soon as the
//!   visitor returns `false`.
//! - **O(1) cloning**: a clone shares every node with its parent; nodes
//!   are duplicated lazily, path by path, only when one side mutates.
//!   Either side may keep mutating without the other observing it.
//! - **Node recycling**: a bounded [`FreeList`] shared across a clone
//!   family keeps allocator churn down in insert/delete-heavy loads.
//!
//! ## Example
//!
//! ```rust
//! use cowtree::CowTree;
//!
//! let mut tree: CowTree<i32> = CowTree::new(8);
//! for item in [5, 1, 4, 2, 3] {
//!     tree.replace_or_insert(item);
//! }
//!
//! assert_eq!(tree.len(), 5);
//! assert_eq!(tree.min(), Some(&1));
//!
//! // A clone is O(1) and fully independent afterwards.
//! let snapshot = tree.clone();
//! tree.delete(&3);
//! assert!(!tree.contains(&3));
//! assert!(snapshot.contains(&3));
//!
//! // Ordered traversal with early stop.
//! let mut seen = Vec::new();
//! tree.ascend(|item| {
//!     seen.push(*item);
//!     *item < 4
//! });
//! assert_eq!(seen, vec![1, 2, 4]);
//! ```
//!
//! ## Feature Flags
//!
//! - `arc`: use `Arc` instead of `Rc` for internal sharing, making
//!   trees and free lists sendable across threads.
//! - `serde`: `Serialize`/`Deserialize` support (ordered sequence form).
//!
//! ## Concurrency
//!
//! A tree takes `&mut self` for every mutation, so a single instance
//! has one writer by construction. With the `arc` feature, clones may
//! be mutated from independent threads; give heavily contended writers
//! their own free list via [`CowTree::clone_with_free_list`] to avoid
//! serializing on the shared pool.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod freelist;
mod node;
mod ordering;
mod tree;

pub use freelist::FreeList;
pub use ordering::Comparator;
pub use ordering::NaturalOrder;
pub use tree::CowTree;
pub use tree::CowTreeIntoIterator;
pub use tree::CowTreeIterator;
pub use tree::DEFAULT_DEGREE;

// =============================================================================
// Tests
// =============================================================================
