//! Transient vectors for destructive batch edits.
//!
//! A transient is a builder over the same RRB trie as
//! [`InternalVector`](crate::vector::InternalVector), with two twists that
//! make bulk construction O(N) instead of O(N log N):
//!
//! * Every node a transient creates is tagged with the transient's *owner
//!   token*, an identity-compared pointer. Operations that reach a node
//!   carrying the live token mutate it in place; any other node (frozen or
//!   owned by a retired token) is path-copied exactly as persistent
//!   operations would.
//! * Appends accumulate in a *fat tail*, a buffer whose capacity is a
//!   configurable multiple of the branching factor. Only when the buffer
//!   fills is it chopped into full leaves and pushed down the trie, so the
//!   per-push bookkeeping almost vanishes.
//!
//! Freezing with [`InternalTransient::to_persistent`] flushes the full
//! chunks of the fat tail, hands the residual chunk to the new vector as its
//! tail and retires the owner token. The transient stays usable afterwards:
//! it keeps the same contents and a fresh token, so later edits path-copy
//! instead of touching nodes the frozen vector now shares.
//!
//! A transient must not be mutated from two threads at once; unlike the
//! persistent vector it makes no attempt to synchronise. The thread-safe
//! alias only makes the underlying pointers atomically counted.

use crate::buffer::Buffer;
use crate::nodes::{push_leaf_into_trie, Leaf, NodeRef, Owner};
use crate::vector::{InternalVector, VectorError};
use crate::WIDTH;
use archery::{ArcK, RcK, SharedPointer, SharedPointerKind};
use std::fmt::{self, Debug, Formatter};
use std::mem;

/// Fat-tail capacity used when building a vector from an iterator.
pub(crate) const BULK_TAIL_CAPACITY: usize = 32 * WIDTH;

/// A mutable builder for [`InternalVector`](crate::vector::InternalVector).
///
/// Use the [`Transient`] alias for the `Rc`-based flavour and
/// [`ThreadSafeTransient`] for the `Arc`-based one.
pub struct InternalTransient<A: Clone + Debug, P: SharedPointerKind> {
    owner: Owner<P>,
    root: Option<NodeRef<A, P>>,
    shift: usize,
    tail: Vec<A>,
    tail_capacity: usize,
    trie_len: usize,
}

/// A transient vector that freezes into a [`Vector`](crate::vector::Vector).
pub type Transient<A> = InternalTransient<A, RcK>;

/// A transient vector that freezes into a
/// [`ThreadSafeVector`](crate::vector::ThreadSafeVector).
pub type ThreadSafeTransient<A> = InternalTransient<A, ArcK>;

impl<A: Clone + Debug, P: SharedPointerKind> InternalTransient<A, P> {
    /// Constructs a new empty transient with the default fat-tail capacity
    /// of `WIDTH` elements.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rrb_vector::Transient;
    /// let mut transient: Transient<u64> = Transient::new();
    /// transient.push_back(1);
    /// assert_eq!(transient.len(), 1);
    /// ```
    pub fn new() -> Self {
        InternalTransient::with_tail_capacity(WIDTH)
            .expect("the branching factor is a valid tail capacity")
    }

    /// Constructs a new empty transient whose fat tail holds `capacity`
    /// elements before flushing into the trie. Bigger capacities amortise
    /// the flush bookkeeping over more pushes.
    ///
    /// Returns an error unless `capacity` is a positive multiple of `WIDTH`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rrb_vector::Transient;
    /// assert!(Transient::<u64>::with_tail_capacity(1024).is_ok());
    /// assert!(Transient::<u64>::with_tail_capacity(0).is_err());
    /// assert!(Transient::<u64>::with_tail_capacity(33).is_err());
    /// ```
    pub fn with_tail_capacity(capacity: usize) -> Result<Self, VectorError> {
        if capacity == 0 || capacity % WIDTH != 0 {
            return Err(VectorError::InvalidTailCapacity(capacity));
        }
        Ok(InternalTransient {
            owner: SharedPointer::new(()),
            root: None,
            shift: 0,
            tail: Vec::new(),
            tail_capacity: capacity,
            trie_len: 0,
        })
    }

    /// Constructs a transient over the contents of a vector. The trie is
    /// shared wholesale; only the tail is copied.
    pub(crate) fn from_vector(vector: &InternalVector<A, P>) -> Self {
        InternalTransient {
            owner: SharedPointer::new(()),
            root: vector.root.clone(),
            shift: vector.shift,
            tail: vector.tail.elements.as_slice().to_vec(),
            tail_capacity: WIDTH,
            trie_len: vector.len - vector.tail.len(),
        }
    }

    /// Returns the number of elements in the transient.
    pub fn len(&self) -> usize {
        self.trie_len + self.tail.len()
    }

    /// Tests whether the transient is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets a reference to the element at the given index.
    ///
    /// Returns `None` if the index does not exist.
    pub fn get(&self, index: usize) -> Option<&A> {
        if index < self.trie_len {
            Some(self.root.as_ref().unwrap().get(self.shift, index))
        } else {
            self.tail.get(index - self.trie_len)
        }
    }

    /// Attempts to replace the element at the given index, mutating in place
    /// wherever this transient owns the path.
    ///
    /// Returns an error if the index does not exist.
    pub fn try_set(&mut self, index: usize, value: A) -> Result<(), VectorError> {
        if index >= self.len() {
            return Err(VectorError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        if index < self.trie_len {
            let owner = self.owner.clone();
            self.root
                .as_mut()
                .unwrap()
                .update(self.shift, index, value, Some(&owner));
        } else {
            self.tail[index - self.trie_len] = value;
        }
        Ok(())
    }

    /// Replaces the element at the given index.
    ///
    /// Panics if the index does not exist.
    pub fn set(&mut self, index: usize, value: A) {
        self.try_set(index, value).unwrap()
    }

    /// Appends an element, filling the fat tail and flushing it into the
    /// trie as full leaves whenever it reaches capacity.
    pub fn push_back(&mut self, item: A) {
        self.tail.push(item);
        if self.tail.len() >= self.tail_capacity {
            let owner = self.owner.clone();
            self.flush_full_chunks(Some(&owner));
        }
    }

    /// Freezes the contents into a persistent vector.
    ///
    /// Full chunks of the fat tail are installed in the trie as frozen
    /// leaves and the residual chunk becomes the vector's tail. The
    /// transient keeps the same contents under a fresh owner token, so
    /// further edits leave the returned vector untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rrb_vector::Transient;
    /// let mut transient: Transient<u64> = Transient::new();
    /// for i in 0..100 {
    ///     transient.push_back(i);
    /// }
    /// let frozen = transient.to_persistent();
    /// transient.push_back(100);
    /// assert_eq!(frozen.len(), 100);
    /// assert_eq!(transient.len(), 101);
    /// ```
    pub fn to_persistent(&mut self) -> InternalVector<A, P> {
        self.flush_full_chunks(None);
        let tail = SharedPointer::new(Leaf::from_buffer(Buffer::from_slice(&self.tail)));
        self.owner = SharedPointer::new(());
        InternalVector {
            root: self.root.clone(),
            shift: self.shift,
            tail,
            len: self.len(),
        }
    }

    /// Chops every full `WIDTH`-sized chunk off the front of the fat tail
    /// and pushes it down the trie. Leaves created here carry `owner`, so a
    /// live transient can keep editing them in place.
    fn flush_full_chunks(&mut self, owner: Option<&Owner<P>>) {
        while self.tail.len() >= WIDTH {
            let remainder = self.tail.split_off(WIDTH);
            let chunk = mem::replace(&mut self.tail, remainder);
            let mut elements = Buffer::new();
            for item in chunk {
                elements.push_back(item);
            }
            let leaf = SharedPointer::new(Leaf {
                owner: owner.cloned(),
                elements,
            });
            push_leaf_into_trie(&mut self.root, &mut self.shift, leaf, owner);
            self.trie_len += WIDTH;
        }
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> Default for InternalTransient<A, P> {
    fn default() -> Self {
        InternalTransient::new()
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> Debug for InternalTransient<A, P> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        fmt.debug_struct("InternalTransient")
            .field("len", &self.len())
            .field("shift", &self.shift)
            .field("tail_capacity", &self.tail_capacity)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vector::Vector;

    #[test]
    fn empty() {
        let transient: Transient<u64> = Transient::new();
        assert!(transient.is_empty());
        assert_eq!(transient.len(), 0);
        assert_eq!(transient.get(0), None);
    }

    #[test]
    fn rejects_bad_capacities() {
        assert_eq!(
            Transient::<u64>::with_tail_capacity(0).unwrap_err(),
            VectorError::InvalidTailCapacity(0)
        );
        assert_eq!(
            Transient::<u64>::with_tail_capacity(WIDTH + 1).unwrap_err(),
            VectorError::InvalidTailCapacity(WIDTH + 1)
        );
        assert!(Transient::<u64>::with_tail_capacity(WIDTH).is_ok());
        assert!(Transient::<u64>::with_tail_capacity(4 * WIDTH).is_ok());
    }

    #[test]
    fn builds_the_same_vector_at_any_capacity() {
        for len in [0usize, 1, 31, 32, 33, 1_000, 5_000] {
            let expected: Vector<usize> = (0..len).collect();
            for capacity in [WIDTH, 2 * WIDTH, 32 * WIDTH] {
                let mut transient =
                    Transient::with_tail_capacity(capacity).unwrap();
                for i in 0..len {
                    transient.push_back(i);
                }
                assert_eq!(transient.len(), len);
                let built = transient.to_persistent();
                assert_eq!(built.check_invariants(), Ok(()));
                assert_eq!(built, expected, "len {} at capacity {}", len, capacity);
            }
        }
    }

    #[test]
    fn get_reads_through_the_trie_and_the_tail() {
        let mut transient: Transient<usize> = Transient::with_tail_capacity(2 * WIDTH).unwrap();
        for i in 0..200 {
            transient.push_back(i);
        }
        for i in (0..200).step_by(13) {
            assert_eq!(transient.get(i), Some(&i));
        }
        assert_eq!(transient.get(200), None);
    }

    #[test]
    fn set_mutates_owned_nodes_in_place() {
        let mut transient: Transient<usize> = Transient::new();
        for i in 0..2_000 {
            transient.push_back(i);
        }
        transient.set(5, 999);
        transient.set(1_500, 888);
        transient.set(1_999, 777);
        assert_eq!(transient.get(5), Some(&999));
        assert_eq!(transient.get(1_500), Some(&888));
        assert_eq!(transient.get(1_999), Some(&777));
        assert!(transient.try_set(2_000, 0).is_err());

        let vector = transient.to_persistent();
        assert_eq!(vector.check_invariants(), Ok(()));
        assert_eq!(vector.get(5), Some(&999));
        assert_eq!(vector.get(1_500), Some(&888));
    }

    #[test]
    fn freezing_detaches_the_vector_from_later_edits() {
        let mut transient: Transient<usize> = Transient::new();
        for i in 0..100 {
            transient.push_back(i);
        }
        let frozen = transient.to_persistent();
        for i in 100..200 {
            transient.push_back(i);
        }
        transient.set(0, 12_345);
        transient.set(50, 54_321);

        assert_eq!(frozen.len(), 100);
        assert!(frozen.iter().copied().eq(0..100));
        assert_eq!(frozen.check_invariants(), Ok(()));

        assert_eq!(transient.len(), 200);
        assert_eq!(transient.get(0), Some(&12_345));
        assert_eq!(transient.get(50), Some(&54_321));
        assert_eq!(transient.get(150), Some(&150));

        let refrozen = transient.to_persistent();
        assert_eq!(refrozen.check_invariants(), Ok(()));
        assert_eq!(refrozen.get(0), Some(&12_345));
        assert_eq!(refrozen.len(), 200);
    }

    #[test]
    fn transient_of_a_vector_leaves_it_untouched() {
        let vector: Vector<usize> = (0..1_000).collect();
        let mut transient = vector.to_transient();
        for i in 0..500 {
            transient.set(i, i + 7_000);
        }
        for i in 1_000..1_100 {
            transient.push_back(i);
        }
        assert!(vector.iter().copied().eq(0..1_000));
        assert_eq!(vector.check_invariants(), Ok(()));

        let edited = transient.to_persistent();
        assert_eq!(edited.len(), 1_100);
        assert_eq!(edited.get(3), Some(&7_003));
        assert_eq!(edited.get(700), Some(&700));
        assert_eq!(edited.get(1_050), Some(&1_050));
        assert_eq!(edited.check_invariants(), Ok(()));
    }

    #[test]
    fn repeated_freezes_share_structure_soundly() {
        let mut transient: Transient<usize> = Transient::with_tail_capacity(2 * WIDTH).unwrap();
        let mut frozen = Vec::new();
        for round in 0..10 {
            for i in 0..100 {
                transient.push_back(round * 100 + i);
            }
            frozen.push(transient.to_persistent());
        }
        for (round, vector) in frozen.iter().enumerate() {
            let len = (round + 1) * 100;
            assert_eq!(vector.len(), len);
            assert!(vector.iter().copied().eq(0..len));
            assert_eq!(vector.check_invariants(), Ok(()));
        }
    }
}
