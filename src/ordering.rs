//! Item ordering protocol.
//!
//! A [`CowTree`](crate::CowTree) never inspects the items it stores; the
//! comparator supplied at construction is the sole definition of order
//! and identity inside the tree. The protocol is a single question: is
//! `a` strictly less than `b`?
//!
//! Two items `a` and `b` are *equivalent* when neither is less than the
//! other. Equivalent items occupy the same slot in the tree: inserting
//! one replaces the other.
//!
//! # Examples
//!
//! ```rust
//! use cowtree::{Comparator, CowTree, NaturalOrder};
//!
//! // The default comparator delegates to `Ord`.
//! assert!(NaturalOrder.less(&1, &2));
//!
//! // Any pure `Fn(&T, &T) -> bool` strict order works too.
//! let mut by_length = CowTree::with_comparator(4, |a: &String, b: &String| a.len() < b.len());
//! by_length.replace_or_insert("hi".to_string());
//! let prior = by_length.replace_or_insert("no".to_string());
//!
//! // "hi" and "no" have equal length, so they are equivalent items.
//! assert_eq!(prior, Some("hi".to_string()));
//! ```

// =============================================================================
// Comparator Trait
// =============================================================================

/// A strict total order over items of type `T`.
///
/// Implementations must be pure and satisfy the usual strict-order
/// contract: irreflexive (`!less(a, a)`), antisymmetric (`less(a, b)`
/// implies `!less(b, a)`) and transitive. A comparator that violates
/// the contract does not cause memory unsafety, but the tree may lose
/// items, duplicate items, or iterate in an inconsistent order.
pub trait Comparator<T> {
    /// Returns `true` if `a` is strictly less than `b`.
    fn less(&self, a: &T, b: &T) -> bool;

    /// Returns `true` if `a` and `b` are equivalent under this order,
    /// meaning neither is less than the other.
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

// =============================================================================
// Provided Comparators
// =============================================================================

/// The comparator that delegates to the item's [`Ord`] instance.
///
/// This is the default order for [`CowTree`](crate::CowTree); trees
/// built with [`CowTree::new`](crate::CowTree::new) use it.
///
/// # Examples
///
/// ```rust
/// use cowtree::{Comparator, NaturalOrder};
///
/// assert!(NaturalOrder.less(&"apple", &"banana"));
/// assert!(!NaturalOrder.less(&3, &3));
/// assert!(NaturalOrder.equivalent(&3, &3));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        a < b
    }
}

/// Any pure closure `Fn(&T, &T) -> bool` implementing a strict order
/// can serve as a comparator directly.
impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn less(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

// =============================================================================
// Tests
// =============================================================================
