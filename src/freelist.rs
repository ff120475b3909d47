//! Recycled-node pool shared across a clone family.
//!
//! Structural churn in a B-tree constantly retires nodes (merges,
//! root shrinks, clears) and mints new ones (splits, root growth,
//! copy-on-write duplication). The [`FreeList`] is a bounded stack that
//! keeps retired nodes around, cleared, so their buffers can back the
//! next allocation instead of going through the allocator again.
//!
//! One free list is shared by a tree and every clone derived from it,
//! so recycled capacity survives cloning. The pool lives behind a
//! mutex; sharing one list between clones that write from different
//! threads is safe but serializes them on the pool, so concurrent
//! writers are better off constructing their clones with private lists
//! via [`CowTree::with_free_list`](crate::CowTree::with_free_list).

use parking_lot::Mutex;

use crate::ReferenceCounter;
use crate::node::{Epoch, Node, NodeRef};

/// Pool capacity used by [`FreeList::default`].
const DEFAULT_CAPACITY: usize = 32;

/// What became of a node handed to [`FreeList::recycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FreeOutcome {
    /// The node was cleared and pushed onto the pool.
    Recycled,
    /// The pool was at capacity; the node went back to the allocator.
    PoolFull,
    /// The node is still referenced elsewhere (a clone sibling holds
    /// it) and was merely released.
    Shared,
}

/// A bounded stack of cleared nodes kept for reuse.
///
/// Construct one explicitly to control its capacity or to give a clone
/// its own pool; trees built with [`CowTree::new`](crate::CowTree::new)
/// create a default-capacity list of their own.
///
/// # Examples
///
/// ```rust
/// use cowtree::{CowTree, FreeList, NaturalOrder};
///
/// let free_list = FreeList::new(64);
/// let mut tree: CowTree<i32> = CowTree::with_free_list(4, NaturalOrder, free_list);
/// tree.replace_or_insert(1);
/// ```
pub struct FreeList<T> {
    capacity: usize,
    pool: Mutex<Vec<NodeRef<T>>>,
}

impl<T> FreeList<T> {
    /// Creates a free list retaining at most `capacity` nodes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pool: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Number of nodes currently pooled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.lock().len()
    }

    /// Returns `true` if no nodes are pooled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.lock().is_empty()
    }

    /// Maximum number of nodes the pool retains.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pops a recycled node, or allocates a fresh one, stamped with
    /// `epoch`.
    pub(crate) fn new_node(&self, epoch: Epoch) -> NodeRef<T> {
        let recycled = self.pool.lock().pop();
        recycled.map_or_else(
            || ReferenceCounter::new(Node::empty(epoch)),
            |mut link| {
                if let Some(node) = ReferenceCounter::get_mut(&mut link) {
                    node.epoch = epoch;
                }
                link
            },
        )
    }

    /// Releases a node that fell out of the tree.
    ///
    /// Only a uniquely-owned handle may be cleared and pooled; a node
    /// still shared with a clone is simply dropped, which releases this
    /// tree's reference without touching the shared contents.
    pub(crate) fn recycle(&self, mut link: NodeRef<T>) -> FreeOutcome {
        let Some(node) = ReferenceCounter::get_mut(&mut link) else {
            return FreeOutcome::Shared;
        };
        let mut pool = self.pool.lock();
        if pool.len() >= self.capacity {
            return FreeOutcome::PoolFull;
        }
        node.items.clear();
        node.children.clear();
        pool.push(link);
        FreeOutcome::Recycled
    }
}

impl<T: Clone> FreeList<T> {
    /// Copy-on-write duplication: a private copy of `source` stamped
    /// with `epoch`, its items cloned and its children still shared.
    pub(crate) fn duplicate(&self, source: &Node<T>, epoch: Epoch) -> NodeRef<T> {
        let mut link = self.new_node(epoch);
        let node = ReferenceCounter::make_mut(&mut link);
        node.items.extend(source.items.iter().cloned());
        node.children.extend(source.children.iter().cloned());
        link
    }
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> std::fmt::Debug for FreeList<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("FreeList")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
