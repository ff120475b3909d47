//! The public B-tree sorted-set container.
//!
//! [`CowTree`] owns a root link, an item count, the construction-time
//! degree and comparator, a shared [`FreeList`] and its current epoch.
//! Every mutating entry point routes through the root, performing the
//! copy-on-write duplication the accessed path needs; every read walks
//! shared structure untouched.
//!
//! # Cloning
//!
//! `clone` is O(1): the clone takes the same root link and free list
//! and a freshly minted epoch. From that moment every pre-existing node
//! is frozen for the clone (foreign epoch), and frozen for the original
//! as well wherever the clone still holds it (shared link); both sides
//! re-privatize paths lazily as they mutate. See
//! [`writable`](crate::node::writable) for the exact rule.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

use crate::ReferenceCounter;
use crate::freelist::{FreeList, FreeOutcome};
use crate::node::{
    Direction, Epoch, Node, NodeRef, RemoveKind, TreeContext, insert_into, remove_from, writable,
};
use crate::ordering::{Comparator, NaturalOrder};

/// Degree used by [`Default`], [`FromIterator`] and serde
/// deserialization, where no explicit degree can be supplied.
pub const DEFAULT_DEGREE: usize = 32;

// =============================================================================
// CowTree Definition
// =============================================================================

/// An ordered set of items backed by a B-tree with copy-on-write
/// cloning.
///
/// Items are kept in the order defined by the comparator `C`; two items
/// neither of which is less than the other are *equivalent* and occupy
/// a single slot. Inserting over an equivalent item replaces it and
/// returns the prior one.
///
/// The `degree` construction parameter controls fan-out: every node
/// except the root holds between `degree - 1` and `2 * degree - 1`
/// items.
///
/// # Time Complexity
///
/// | Operation              | Complexity   |
/// |------------------------|--------------|
/// | `replace_or_insert`    | O(log N)     |
/// | `delete` / min / max   | O(log N)     |
/// | `get` / `contains`     | O(log N)     |
/// | `min` / `max`          | O(log N)     |
/// | `len` / `is_empty`     | O(1)         |
/// | `clone`                | O(1)         |
/// | ascend / descend       | O(log N + k) |
///
/// # Examples
///
/// ```rust
/// use cowtree::CowTree;
///
/// let mut tree: CowTree<i32> = CowTree::new(4);
/// assert_eq!(tree.replace_or_insert(2), None);
/// assert_eq!(tree.replace_or_insert(1), None);
/// assert_eq!(tree.replace_or_insert(2), Some(2));
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.delete_min(), Some(1));
/// ```
pub struct CowTree<T, C = NaturalOrder> {
    degree: usize,
    length: usize,
    epoch: Epoch,
    root: Option<NodeRef<T>>,
    free_list: ReferenceCounter<FreeList<T>>,
    comparator: C,
}

// =============================================================================
// Construction
// =============================================================================

impl<T: Clone + Ord> CowTree<T> {
    /// Creates an empty tree ordered by the items' [`Ord`] instance.
    ///
    /// # Panics
    ///
    /// Panics if `degree < 2`: a node must be able to hold at least one
    /// item after giving one up.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let tree: CowTree<i32> = CowTree::new(32);
    /// assert!(tree.is_empty());
    /// ```
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self::with_comparator(degree, NaturalOrder)
    }
}

impl<T: Clone, C: Comparator<T>> CowTree<T, C> {
    /// Creates an empty tree ordered by `comparator`.
    ///
    /// # Panics
    ///
    /// Panics if `degree < 2`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let mut by_second = CowTree::with_comparator(4, |a: &(i32, i32), b: &(i32, i32)| a.1 < b.1);
    /// by_second.replace_or_insert((1, 20));
    /// by_second.replace_or_insert((2, 10));
    /// assert_eq!(by_second.min(), Some(&(2, 10)));
    /// ```
    #[must_use]
    pub fn with_comparator(degree: usize, comparator: C) -> Self {
        Self::with_free_list(degree, comparator, FreeList::default())
    }

    /// Creates an empty tree that recycles nodes through the supplied
    /// free list instead of a default-capacity one.
    ///
    /// # Panics
    ///
    /// Panics if `degree < 2`.
    #[must_use]
    pub fn with_free_list(degree: usize, comparator: C, free_list: FreeList<T>) -> Self {
        assert!(degree >= 2, "CowTree degree must be at least 2, got {degree}");
        Self {
            degree,
            length: 0,
            epoch: Epoch::mint(),
            root: None,
            free_list: ReferenceCounter::new(free_list),
            comparator,
        }
    }

    /// Clones this tree but gives the clone its own free list.
    ///
    /// A plain [`clone`](Clone::clone) shares the parent's pool, which
    /// is what clone-heavy single-threaded workloads want. Writers that
    /// will run on independent threads are better served by private
    /// pools, which this constructor provides without giving up the
    /// O(1) structural sharing.
    #[must_use]
    pub fn clone_with_free_list(&self, free_list: FreeList<T>) -> Self
    where
        C: Clone,
    {
        Self {
            degree: self.degree,
            length: self.length,
            epoch: Epoch::mint(),
            root: self.root.clone(),
            free_list: ReferenceCounter::new(free_list),
            comparator: self.comparator.clone(),
        }
    }
}

// =============================================================================
// Accessors
// =============================================================================

impl<T, C> CowTree<T, C> {
    /// Number of items stored.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the tree holds no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The degree supplied at construction.
    #[inline]
    #[must_use]
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// Collects the items in ascending order into a snapshot iterator.
    ///
    /// This is a convenience over the predicate traversals; it takes an
    /// eager snapshot of references, so the usual borrow rules keep the
    /// tree unmodified while the iterator lives.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let tree: CowTree<i32> = [3, 1, 2].into_iter().collect();
    /// let items: Vec<&i32> = tree.iter().collect();
    /// assert_eq!(items, vec![&1, &2, &3]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> CowTreeIterator<'_, T> {
        let mut entries = Vec::with_capacity(self.length);
        if let Some(root) = self.root.as_ref() {
            collect_ascending(root, &mut entries);
        }
        CowTreeIterator {
            entries,
            current_index: 0,
        }
    }
}

/// In-order walk gathering item references.
fn collect_ascending<'a, T>(node: &'a Node<T>, out: &mut Vec<&'a T>) {
    if node.is_leaf() {
        out.extend(node.items.iter());
        return;
    }
    for (index, item) in node.items.iter().enumerate() {
        collect_ascending(&node.children[index], out);
        out.push(item);
    }
    if let Some(last) = node.children.last() {
        collect_ascending(last, out);
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<T: Clone, C: Comparator<T>> CowTree<T, C> {
    /// Returns the stored item equivalent to `key`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let mut tree: CowTree<i32> = CowTree::new(4);
    /// tree.replace_or_insert(7);
    /// assert_eq!(tree.get(&7), Some(&7));
    /// assert_eq!(tree.get(&8), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &T) -> Option<&T> {
        self.root.as_ref()?.find(&self.comparator, key)
    }

    /// Returns `true` if an item equivalent to `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.get(key).is_some()
    }

    /// The smallest item, or `None` when empty.
    #[must_use]
    pub fn min(&self) -> Option<&T> {
        self.root.as_ref()?.first_item()
    }

    /// The largest item, or `None` when empty.
    #[must_use]
    pub fn max(&self) -> Option<&T> {
        self.root.as_ref()?.last_item()
    }
}

// =============================================================================
// Mutation
// =============================================================================

impl<T: Clone, C: Comparator<T>> CowTree<T, C> {
    /// Inserts `item`, replacing and returning the stored equivalent
    /// item if one was present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let mut by_first_char =
    ///     CowTree::with_comparator(4, |a: &&str, b: &&str| a.as_bytes()[0] < b.as_bytes()[0]);
    /// assert_eq!(by_first_char.replace_or_insert("apple"), None);
    /// assert_eq!(by_first_char.replace_or_insert("apricot"), Some("apple"));
    /// assert_eq!(by_first_char.len(), 1);
    /// ```
    pub fn replace_or_insert(&mut self, item: T) -> Option<T> {
        let Self {
            degree,
            length,
            epoch,
            root,
            free_list,
            comparator,
        } = self;
        let ctx = TreeContext {
            comparator,
            epoch: *epoch,
            free_list: &**free_list,
            max_items: 2 * *degree - 1,
            min_items: *degree - 1,
        };
        match root {
            None => {
                let mut fresh = ctx.free_list.new_node(ctx.epoch);
                ReferenceCounter::make_mut(&mut fresh).items.push(item);
                *root = Some(fresh);
                *length = 1;
                None
            }
            Some(link) => {
                if link.items.len() >= ctx.max_items {
                    // Grow: the old root becomes the left child of a
                    // fresh root holding the promoted median.
                    let (median, right) = {
                        let node = writable(link, ctx.epoch, ctx.free_list);
                        node.split(ctx.min_items, &ctx)
                    };
                    let new_root = ctx.free_list.new_node(ctx.epoch);
                    let old_root = mem::replace(link, new_root);
                    let node = ReferenceCounter::make_mut(link);
                    node.items.push(median);
                    node.children.push(old_root);
                    node.children.push(right);
                }
                let displaced = insert_into(link, item, &ctx);
                if displaced.is_none() {
                    *length += 1;
                }
                displaced
            }
        }
    }

    /// Removes and returns the stored item equivalent to `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let mut tree: CowTree<i32> = [1, 2, 3].into_iter().collect();
    /// assert_eq!(tree.delete(&2), Some(2));
    /// assert_eq!(tree.delete(&2), None);
    /// ```
    pub fn delete(&mut self, key: &T) -> Option<T> {
        self.remove_root(RemoveKind::Item(key))
    }

    /// Removes and returns the smallest item.
    pub fn delete_min(&mut self) -> Option<T> {
        self.remove_root(RemoveKind::Min)
    }

    /// Removes and returns the largest item.
    pub fn delete_max(&mut self) -> Option<T> {
        self.remove_root(RemoveKind::Max)
    }

    fn remove_root(&mut self, kind: RemoveKind<'_, T>) -> Option<T> {
        let Self {
            degree,
            length,
            epoch,
            root,
            free_list,
            comparator,
        } = self;
        let ctx = TreeContext {
            comparator,
            epoch: *epoch,
            free_list: &**free_list,
            max_items: 2 * *degree - 1,
            min_items: *degree - 1,
        };
        let link = root.as_mut()?;
        if link.items.is_empty() {
            return None;
        }
        let removed = remove_from(link, kind, &ctx);
        if link.items.is_empty() && !link.is_leaf() {
            // Shrink: deletion drained the root; its sole remaining
            // child takes over and the husk goes back to the pool.
            let taken = ReferenceCounter::get_mut(link).map(|node| node.children.remove(0));
            let child = taken.unwrap_or_else(|| link.children[0].clone());
            let old_root = mem::replace(link, child);
            ctx.free_list.recycle(old_root);
        }
        if removed.is_some() {
            *length -= 1;
        }
        removed
    }

    /// Drops every item.
    ///
    /// With `recycle` set, the walk feeds uniquely-owned nodes to the
    /// free list until it reaches capacity, so follow-up insertions
    /// start from a warm pool; nodes still shared with clones are left
    /// to them. Without it the whole structure is released in one go.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let mut tree: CowTree<i32> = (0..100).collect();
    /// tree.clear(true);
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.min(), None);
    /// ```
    pub fn clear(&mut self, recycle: bool) {
        if let Some(root) = self.root.take()
            && recycle
        {
            reset_into_pool(root, &self.free_list);
        }
        self.length = 0;
    }
}

/// Post-order release of a subtree into the pool; stops early once the
/// pool reports itself full.
fn reset_into_pool<T: Clone>(mut link: NodeRef<T>, free_list: &FreeList<T>) -> bool {
    let children = ReferenceCounter::get_mut(&mut link)
        .map_or_else(Vec::new, |node| mem::take(&mut node.children));
    for child in children {
        if !reset_into_pool(child, free_list) {
            return false;
        }
    }
    free_list.recycle(link) != FreeOutcome::PoolFull
}

// =============================================================================
// Ordered Traversal
// =============================================================================

impl<T: Clone, C: Comparator<T>> CowTree<T, C> {
    /// Visits every item in ascending order until `visit` returns
    /// `false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let tree: CowTree<i32> = [2, 3, 1].into_iter().collect();
    /// let mut seen = Vec::new();
    /// tree.ascend(|item| {
    ///     seen.push(*item);
    ///     true
    /// });
    /// assert_eq!(seen, vec![1, 2, 3]);
    /// ```
    pub fn ascend<F>(&self, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(Direction::Ascending, None, None, false, &mut visit);
    }

    /// Visits every item `x` with `pivot <= x` in ascending order until
    /// `visit` returns `false`.
    pub fn ascend_greater_or_equal<F>(&self, pivot: &T, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(Direction::Ascending, Some(pivot), None, true, &mut visit);
    }

    /// Visits every item `x` with `x < stop` in ascending order until
    /// `visit` returns `false`.
    pub fn ascend_less_than<F>(&self, stop: &T, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(Direction::Ascending, None, Some(stop), false, &mut visit);
    }

    /// Visits every item `x` with `greater_or_equal <= x < less_than`
    /// in ascending order until `visit` returns `false`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let tree: CowTree<i32> = (0..10).collect();
    /// let mut seen = Vec::new();
    /// tree.ascend_range(&3, &7, |item| {
    ///     seen.push(*item);
    ///     true
    /// });
    /// assert_eq!(seen, vec![3, 4, 5, 6]);
    /// ```
    pub fn ascend_range<F>(&self, greater_or_equal: &T, less_than: &T, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(
            Direction::Ascending,
            Some(greater_or_equal),
            Some(less_than),
            true,
            &mut visit,
        );
    }

    /// Visits every item in descending order until `visit` returns
    /// `false`.
    pub fn descend<F>(&self, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(Direction::Descending, None, None, false, &mut visit);
    }

    /// Visits every item `x` with `x <= pivot` in descending order
    /// until `visit` returns `false`.
    pub fn descend_less_or_equal<F>(&self, pivot: &T, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(Direction::Descending, Some(pivot), None, true, &mut visit);
    }

    /// Visits every item `x` with `stop < x` in descending order until
    /// `visit` returns `false`.
    pub fn descend_greater_than<F>(&self, stop: &T, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(Direction::Descending, None, Some(stop), false, &mut visit);
    }

    /// Visits every item `x` with `greater_than < x <= less_or_equal`
    /// in descending order until `visit` returns `false`.
    ///
    /// Note the argument order: the inclusive *upper* bound comes
    /// first, matching the direction of travel. Equal bounds select an
    /// empty range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cowtree::CowTree;
    ///
    /// let tree: CowTree<i32> = (0..10).collect();
    /// let mut seen = Vec::new();
    /// tree.descend_range(&7, &3, |item| {
    ///     seen.push(*item);
    ///     true
    /// });
    /// assert_eq!(seen, vec![7, 6, 5, 4]);
    /// ```
    pub fn descend_range<F>(&self, less_or_equal: &T, greater_than: &T, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.traverse(
            Direction::Descending,
            Some(less_or_equal),
            Some(greater_than),
            true,
            &mut visit,
        );
    }

    fn traverse<F>(
        &self,
        direction: Direction,
        start: Option<&T>,
        stop: Option<&T>,
        include_start: bool,
        visit: &mut F,
    ) where
        F: FnMut(&T) -> bool,
    {
        if let Some(root) = self.root.as_ref() {
            root.iterate(
                direction,
                start,
                stop,
                include_start,
                false,
                &self.comparator,
                visit,
            );
        }
    }
}

// =============================================================================
// Clone
// =============================================================================

impl<T, C: Clone> Clone for CowTree<T, C> {
    /// Constant-time clone sharing all structure with the parent.
    ///
    /// The clone is minted a fresh epoch, so every shared node is
    /// frozen for it; the parent in turn sees those nodes as shared
    /// links. Mutation on either side duplicates just the touched path.
    fn clone(&self) -> Self {
        Self {
            degree: self.degree,
            length: self.length,
            epoch: Epoch::mint(),
            root: self.root.clone(),
            free_list: self.free_list.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the items of a [`CowTree`] in ascending order.
pub struct CowTreeIterator<'a, T> {
    entries: Vec<&'a T>,
    current_index: usize,
}

impl<'a, T> Iterator for CowTreeIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.entries.len() {
            None
        } else {
            let entry = self.entries[self.current_index];
            self.current_index += 1;
            Some(entry)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for CowTreeIterator<'_, T> {
    fn len(&self) -> usize {
        self.entries.len().saturating_sub(self.current_index)
    }
}

/// An owning iterator over the items of a [`CowTree`] in ascending
/// order.
pub struct CowTreeIntoIterator<T> {
    entries: Vec<T>,
    current_index: usize,
}

impl<T: Clone> Iterator for CowTreeIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.entries.len() {
            None
        } else {
            let entry = self.entries[self.current_index].clone();
            self.current_index += 1;
            Some(entry)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for CowTreeIntoIterator<T> {
    fn len(&self) -> usize {
        self.entries.len().saturating_sub(self.current_index)
    }
}

impl<T: Clone, C> IntoIterator for CowTree<T, C> {
    type Item = T;
    type IntoIter = CowTreeIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<T> = self.iter().cloned().collect();
        CowTreeIntoIterator {
            entries,
            current_index: 0,
        }
    }
}

impl<'a, T, C> IntoIterator for &'a CowTree<T, C> {
    type Item = &'a T;
    type IntoIter = CowTreeIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T: Clone + Ord> Default for CowTree<T> {
    /// An empty natural-order tree of degree [`DEFAULT_DEGREE`].
    fn default() -> Self {
        Self::new(DEFAULT_DEGREE)
    }
}

impl<T: Clone + Ord> FromIterator<T> for CowTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new(DEFAULT_DEGREE);
        tree.extend(iter);
        tree
    }
}

impl<T: Clone, C: Comparator<T>> Extend<T> for CowTree<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.replace_or_insert(item);
        }
    }
}

impl<T: Clone + PartialEq, C> PartialEq for CowTree<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Clone + Eq, C> Eq for CowTree<T, C> {}

/// Hashes the length, then each item in ascending order, so equal trees
/// hash equally regardless of insertion history.
impl<T, C> Hash for CowTree<T, C>
where
    T: Clone + Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: Clone + fmt::Debug, C> fmt::Debug for CowTree<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Clone + fmt::Display, C> fmt::Display for CowTree<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for item in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{item}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T, C> serde::Serialize for CowTree<T, C>
where
    T: serde::Serialize + Clone,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct CowTreeVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<T> CowTreeVisitor<T> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for CowTreeVisitor<T>
where
    T: serde::Deserialize<'de> + Clone + Ord,
{
    type Value = CowTree<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a sequence of items")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut tree = CowTree::new(DEFAULT_DEGREE);
        while let Some(item) = access.next_element()? {
            tree.replace_or_insert(item);
        }
        Ok(tree)
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for CowTree<T>
where
    T: serde::Deserialize<'de> + Clone + Ord,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(CowTreeVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Walks the whole tree asserting every structural invariant: item
    /// ordering, per-node width limits, child counts, uniform leaf
    /// depth and the key-interval property.
    fn audit<T: Clone + Ord, C: Comparator<T>>(tree: &CowTree<T, C>) {
        let Some(root) = tree.root.as_ref() else {
            assert_eq!(tree.len(), 0);
            return;
        };
        let min_items = tree.degree - 1;
        let max_items = 2 * tree.degree - 1;
        let mut leaf_depth = None;
        let counted = audit_node(
            root,
            min_items,
            max_items,
            true,
            0,
            &mut leaf_depth,
            None,
            None,
            &tree.comparator,
        );
        assert_eq!(counted, tree.len(), "length drifted from tree contents");
    }

    #[allow(clippy::too_many_arguments)]
    fn audit_node<T: Clone, C: Comparator<T>>(
        node: &Node<T>,
        min_items: usize,
        max_items: usize,
        is_root: bool,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        low: Option<&T>,
        high: Option<&T>,
        comparator: &C,
    ) -> usize {
        if !is_root {
            assert!(node.items.len() >= min_items, "node below minimum width");
        }
        assert!(node.items.len() <= max_items, "node above maximum width");
        for pair in node.items.windows(2) {
            assert!(
                comparator.less(&pair[0], &pair[1]),
                "items not strictly ascending"
            );
        }
        if let Some(low) = low {
            assert!(node.items.iter().all(|item| comparator.less(low, item)));
        }
        if let Some(high) = high {
            assert!(node.items.iter().all(|item| comparator.less(item, high)));
        }
        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) => assert_eq!(depth, expected, "leaves at differing depths"),
            }
            return node.items.len();
        }
        assert_eq!(
            node.children.len(),
            node.items.len() + 1,
            "internal node child count mismatch"
        );
        let mut total = node.items.len();
        for (index, child) in node.children.iter().enumerate() {
            let child_low = index.checked_sub(1).map(|i| &node.items[i]).or(low);
            let child_high = node.items.get(index).or(high);
            total += audit_node(
                child,
                min_items,
                max_items,
                false,
                depth + 1,
                leaf_depth,
                child_low,
                child_high,
                comparator,
            );
        }
        total
    }

    fn collect<T: Clone + Ord, C: Comparator<T>>(tree: &CowTree<T, C>) -> Vec<T> {
        tree.iter().cloned().collect()
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[rstest]
    fn test_new_creates_empty_tree() {
        let tree: CowTree<i32> = CowTree::new(4);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.degree(), 4);
        assert_eq!(tree.min(), None);
        assert_eq!(tree.max(), None);
    }

    #[rstest]
    #[should_panic(expected = "degree must be at least 2")]
    fn test_degree_one_is_rejected() {
        let _ = CowTree::<i32>::new(1);
    }

    #[rstest]
    #[should_panic(expected = "degree must be at least 2")]
    fn test_degree_zero_is_rejected() {
        let _ = CowTree::<i32>::new(0);
    }

    // =========================================================================
    // Insert / Structure Tests
    // =========================================================================

    #[rstest]
    #[case::minimal_degree(2)]
    #[case::small_degree(3)]
    #[case::wide_degree(16)]
    fn test_insert_keeps_invariants(#[case] degree: usize) {
        let mut tree: CowTree<i32> = CowTree::new(degree);
        for value in [50, 20, 80, 10, 30, 70, 90, 25, 35, 60, 100, 5, 15] {
            assert_eq!(tree.replace_or_insert(value), None);
            audit(&tree);
        }
        assert_eq!(tree.len(), 13);
        assert_eq!(tree.min(), Some(&5));
        assert_eq!(tree.max(), Some(&100));
    }

    #[rstest]
    fn test_root_split_grows_depth() {
        // Degree 2: the root overflows at 3 items.
        let mut tree: CowTree<i32> = CowTree::new(2);
        for value in 0..8 {
            tree.replace_or_insert(value);
            audit(&tree);
        }
        assert_eq!(collect(&tree), (0..8).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_replace_returns_prior_item_and_keeps_length() {
        let mut tree: CowTree<i32> = (0..50).collect();
        for value in 0..50 {
            assert_eq!(tree.replace_or_insert(value), Some(value));
        }
        assert_eq!(tree.len(), 50);
        audit(&tree);
    }

    // =========================================================================
    // Delete Tests
    // =========================================================================

    #[rstest]
    #[case::minimal_degree(2)]
    #[case::small_degree(3)]
    fn test_delete_every_item(#[case] degree: usize) {
        let mut tree: CowTree<i32> = CowTree::with_comparator(degree, NaturalOrder);
        let values: Vec<i32> = (0..60).map(|i| (i * 37) % 60).collect();
        tree.extend(values.clone());
        for value in values {
            assert_eq!(tree.delete(&value), Some(value));
            audit(&tree);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.delete(&0), None);
    }

    #[rstest]
    fn test_delete_min_drains_ascending() {
        let mut tree: CowTree<i32> = (0..40).map(|i| (i * 23) % 40).collect();
        let mut drained = Vec::new();
        while let Some(item) = tree.delete_min() {
            drained.push(item);
            audit(&tree);
        }
        assert_eq!(drained, (0..40).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_delete_max_drains_descending() {
        let mut tree: CowTree<i32> = (0..40).map(|i| (i * 27) % 40).collect();
        let mut drained = Vec::new();
        while let Some(item) = tree.delete_max() {
            drained.push(item);
            audit(&tree);
        }
        assert_eq!(drained, (0..40).rev().collect::<Vec<_>>());
    }

    #[rstest]
    fn test_delete_on_empty_tree() {
        let mut tree: CowTree<i32> = CowTree::new(3);
        assert_eq!(tree.delete(&1), None);
        assert_eq!(tree.delete_min(), None);
        assert_eq!(tree.delete_max(), None);
    }

    // =========================================================================
    // Clear Tests
    // =========================================================================

    #[rstest]
    fn test_clear_with_recycling_warms_the_pool() {
        let mut tree: CowTree<i32> = CowTree::new(2);
        tree.extend(0..100);
        assert!(tree.free_list.is_empty());

        tree.clear(true);

        assert!(tree.is_empty());
        assert_eq!(tree.min(), None);
        assert_eq!(tree.free_list.len(), tree.free_list.capacity());
    }

    #[rstest]
    fn test_clear_without_recycling_leaves_pool_cold() {
        let mut tree: CowTree<i32> = CowTree::new(2);
        tree.extend(0..100);

        tree.clear(false);

        assert!(tree.is_empty());
        assert!(tree.free_list.is_empty());
    }

    // =========================================================================
    // Clone / Copy-on-Write Tests
    // =========================================================================

    #[rstest]
    fn test_clone_shares_then_diverges() {
        let mut original: CowTree<i32> = (0..100).collect();
        let mut snapshot = original.clone();

        original.delete(&10);
        snapshot.replace_or_insert(1000);

        assert!(!original.contains(&10));
        assert!(snapshot.contains(&10));
        assert!(!original.contains(&1000));
        assert!(snapshot.contains(&1000));
        audit(&original);
        audit(&snapshot);
    }

    #[rstest]
    fn test_clone_chain_stays_independent() {
        let mut first: CowTree<i32> = (0..50).collect();
        let mut second = first.clone();
        let mut third = second.clone();

        first.clear(true);
        second.delete(&25);
        third.replace_or_insert(99);

        assert!(first.is_empty());
        assert_eq!(second.len(), 49);
        assert_eq!(third.len(), 50);
        assert_eq!(collect(&third), (0..50).collect::<Vec<_>>());
        audit(&second);
        audit(&third);
    }

    #[rstest]
    fn test_clone_with_free_list_uses_private_pool() {
        let original: CowTree<i32> = (0..50).collect();
        let mut private = original.clone_with_free_list(FreeList::new(8));

        private.clear(true);

        assert_eq!(original.free_list.len(), 0);
        assert_eq!(private.len(), 0);
        assert_eq!(collect(&original), (0..50).collect::<Vec<_>>());
    }

    // =========================================================================
    // Display / Debug Tests
    // =========================================================================

    #[rstest]
    fn test_display_empty_tree() {
        let tree: CowTree<i32> = CowTree::new(4);
        assert_eq!(format!("{tree}"), "{}");
    }

    #[rstest]
    fn test_display_sorted_items() {
        let tree: CowTree<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(format!("{tree}"), "{1, 2, 3}");
    }

    #[rstest]
    fn test_debug_renders_as_set() {
        let tree: CowTree<i32> = [2, 1].into_iter().collect();
        assert_eq!(format!("{tree:?}"), "{1, 2}");
    }

    // =========================================================================
    // Equality / Hash Tests
    // =========================================================================

    #[rstest]
    fn test_equality_ignores_insertion_order() {
        let forward: CowTree<i32> = (0..20).collect();
        let backward: CowTree<i32> = (0..20).rev().collect();
        assert_eq!(forward, backward);
    }

    #[rstest]
    fn test_hash_consistent_with_equality() {
        use std::collections::hash_map::DefaultHasher;

        let forward: CowTree<i32> = (0..20).collect();
        let backward: CowTree<i32> = (0..20).rev().collect();

        let mut first = DefaultHasher::new();
        forward.hash(&mut first);
        let mut second = DefaultHasher::new();
        backward.hash(&mut second);
        assert_eq!(first.finish(), second.finish());
    }

    // =========================================================================
    // Serde Tests
    // =========================================================================

    #[cfg(feature = "serde")]
    #[rstest]
    fn test_serde_round_trip_preserves_items() {
        let tree: CowTree<i32> = [5, 3, 8, 1].into_iter().collect();
        let encoded = serde_json::to_string(&tree).expect("serialization failed");
        assert_eq!(encoded, "[1,3,5,8]");

        let decoded: CowTree<i32> = serde_json::from_str(&encoded).expect("deserialization failed");
        assert_eq!(decoded, tree);
    }
}
