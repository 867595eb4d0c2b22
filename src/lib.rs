//! A library implementing a persistent vector as an RRB tree.
//!
//! # What are RRB trees?
//!
//! A Relaxed Radix Balanced (RRB) tree is a data structure for representing
//! a sequence of items, similar to a [`Vec<T>`]. Random access, updates,
//! pushes and pops compare with [`Vec<T>`] at a logarithmic penalty, while
//! the operations a [`Vec<T>`] is bad at come cheap: cloning is O(1) through
//! structural sharing, and splitting, slicing, concatenating and inserting
//! or removing in the middle are all logarithmic. The "relaxed" part of the
//! name is what buys the cheap concatenation: interior nodes are allowed to
//! be moderately under-full and carry a small table of child sizes, so two
//! trees can be merged without rebuilding either.
//!
//! The trade-off is constant factors: for small sequences that are only ever
//! pushed to and indexed, [`Vec<T>`] wins comfortably. Reach for
//! [`Vector<T>`] when you need persistence (keeping old versions alive
//! cheaply) or fast splits and concatenations.
//!
//! Two companion pieces keep the common paths fast. Appends land in a *tail*
//! leaf stored outside the tree, so only every 32nd push touches the trie at
//! all. And the [`Transient`] builder batches construction: it tags the
//! nodes it creates with an owner token and mutates them in place, giving
//! O(N) bulk loads before freezing into an ordinary immutable [`Vector<T>`].
//!
//! [`Vec<T>`]: https://doc.rust-lang.org/std/vec/struct.Vec.html
//! [`Vector<T>`]: crate::Vector
//! [`Transient`]: crate::Transient
//!
//! # Example
//!
//! ```
//! # #[macro_use] extern crate rrb_vector;
//! # use rrb_vector::Vector;
//! let before: Vector<u64> = (0..1000).collect();
//! let mut after = before.clone();
//! after.set(500, 42);
//! let tail = after.split_off(900);
//!
//! assert_eq!(before.get(500), Some(&500));
//! assert_eq!(after.get(500), Some(&42));
//! assert_eq!(after.len(), 900);
//! assert_eq!(tail.len(), 100);
//! ```
#![deny(missing_docs)]

mod buffer;
mod nodes;
mod size_table;

#[macro_use]
pub mod vector;
pub mod transient;

#[doc(inline)]
pub use vector::{InternalVector, IntoIter, Iter, ThreadSafeVector, Vector, VectorError};

#[doc(inline)]
pub use transient::{InternalTransient, ThreadSafeTransient, Transient};

/// The width of the RRB tree nodes: the maximum number of elements in a leaf
/// and the maximum number of children of a branch.
pub const WIDTH: usize = 32;

/// Log2 of `WIDTH`; the number of index bits consumed per tree level.
pub(crate) const BITS: usize = 5;

/// Mask extracting one level's worth of index bits.
pub(crate) const MASK: usize = WIDTH - 1;

/// Upper bound on the height of the tree, comfortably enough for `2^31`
/// elements even with relaxed nodes.
pub(crate) const MAX_HEIGHT: usize = 10;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn width_is_power_of_two() {
        assert!(WIDTH.is_power_of_two());
        assert_eq!(1 << BITS, WIDTH);
        assert_eq!(MASK, WIDTH - 1);
    }

    #[test]
    fn height_bound_covers_the_index_space() {
        assert!(MAX_HEIGHT * BITS + BITS > 31);
    }
}
