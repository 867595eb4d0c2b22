//! A container for representing a sequence of elements.
//!
//! # Terminology
//!
//! The vector is a Relaxed Radix Balanced (RRB) trie. Elements live in leaf
//! nodes of up to `WIDTH` values; branches hold up to `WIDTH` children. The
//! `shift` of the tree is `BITS` times its height, so a dense tree locates
//! the child covering index `i` at a branch with `(i >> shift) & MASK`.
//! Branches that lost their left-packed shape to slicing, concatenation or
//! point edits carry a cumulative size table instead and pay a short scan on
//! lookup.
//!
//! The last few appended elements live outside the trie in the *tail*, a
//! single leaf referenced by the vector itself. Appends go straight into the
//! tail and only every `WIDTH` pushes does a full leaf descend the right
//! spine of the trie, which is what makes `push_back` amortised O(1).
//! Operations that cut the vector may leave the tail empty; `pop_back` and
//! `split_off` promote the rightmost leaf of the trie back into the tail
//! when they need one.
//!
//! # Concatenation
//!
//! `append` walks the right spine of the left tree and the left spine of the
//! right tree down to matching heights and merges the seam level by level.
//! At each level the children around the seam are fed through a
//! redistribution plan that packs slots until the node count is within a
//! small tolerance of optimal. Nodes that already have the right shape are
//! shared with the inputs rather than copied, so concatenating trees that
//! are already balanced reuses almost everything.
//!
//! # Persistence
//!
//! Cloning a vector is O(1): clones share the trie and the tail. Mutating
//! operations copy only the nodes on the path they touch and leave every
//! node shared with other vectors untouched, so an old clone always observes
//! its original contents. The copy-on-write is reference-count driven; a
//! vector that is sole owner of a node edits it in place. For bulk
//! construction and batched edits, [`transient`](crate::transient) vectors
//! tag freshly created nodes with an owner token and skip the path copying
//! entirely until frozen.
//!
//! # Performance
//!
//! Assume the height of the tree is H and the number of elements is N.
//!
//! | Operation | Average case | Worst case |
//! | --- | --- | --- |
//! | [`Push back`][InternalVector::push_back] | O(1) | O(H) |
//! | [`Pop back`][InternalVector::pop_back] | O(1) | O(H) |
//! | [`Pop front`][InternalVector::pop_front] | O(H) | O(H) |
//! | [`Get`][InternalVector::get] | O(H) | O(H) |
//! | [`Set`][InternalVector::set] | O(H) | O(H) |
//! | [`Insert`][InternalVector::insert] | O(H) | O(H) |
//! | [`Remove`][InternalVector::remove] | O(H) | O(H) |
//! | [`Slice`][InternalVector::slice] | O(H) | O(H) |
//! | [`Split off`][InternalVector::split_off] | O(H) | O(H) |
//! | [`Append`][InternalVector::append] | O(H) | O(H) |
//! | [`Clone`][InternalVector::clone] | O(1) | O(1) |
//!
//! H is logarithmic in N for trees built by appends; repeated concatenation
//! of unbalanced pieces can stretch it, but the rebalancing plan keeps the
//! slack bounded.

use crate::buffer::Buffer;
use crate::nodes::{
    check_node, concat_trees, insert_in, push_leaf_into_trie, remove_in, slice_left, slice_right,
    split, take_last_leaf, InsertResult, Leaf, NodeRef,
};
use crate::transient::{InternalTransient, BULK_TAIL_CAPACITY};
use crate::{BITS, MAX_HEIGHT, WIDTH};
use archery::{ArcK, RcK, SharedPointer, SharedPointerKind};
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::mem;
use std::ops::Range;
use thiserror::Error;

/// Construct a vector.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate rrb_vector;
/// # use rrb_vector::Vector;
/// let first = vector![1, 2, 3];
/// let mut second = Vector::new();
/// second.push_back(1);
/// second.push_back(2);
/// second.push_back(3);
/// assert_eq!(first, second);
/// ```
#[macro_export]
macro_rules! vector {
    () => { $crate::vector::Vector::new() };

    ( $($x:expr),* ) => {{
        let mut l = $crate::vector::Vector::new();
        $(
            l.push_back($x);
        )*
            l
    }};

    ( $($x:expr ,)* ) => {{
        let mut l = $crate::vector::Vector::new();
        $(
            l.push_back($x);
        )*
            l
    }};
}

/// Construct a thread-safe vector.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate rrb_vector;
/// # use rrb_vector::ThreadSafeVector;
/// let first = vector_ts![1, 2, 3];
/// let mut second = ThreadSafeVector::new();
/// second.push_back(1);
/// second.push_back(2);
/// second.push_back(3);
/// assert_eq!(first, second);
/// ```
#[macro_export]
macro_rules! vector_ts {
    () => { $crate::vector::ThreadSafeVector::new() };

    ( $($x:expr),* ) => {{
        let mut l = $crate::vector::ThreadSafeVector::new();
        $(
            l.push_back($x);
        )*
            l
    }};

    ( $($x:expr ,)* ) => {{
        let mut l = $crate::vector::ThreadSafeVector::new();
        $(
            l.push_back($x);
        )*
            l
    }};
}

/// The ways an operation on a vector or transient can fail.
///
/// Every failure is reported before the receiver is touched; an operation
/// that returns an error leaves the vector exactly as it was.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum VectorError {
    /// An index-taking operation was called with an index past the end.
    #[error("index {index} is out of bounds in a vector of length {len}")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// The length of the vector at the time of the call.
        len: usize,
    },
    /// An element was requested from an empty vector.
    #[error("tried to remove an element from an empty vector")]
    EmptyVector,
    /// A transient was configured with an unusable tail capacity.
    #[error("transient tail capacity {0} is not a positive multiple of the branching factor")]
    InvalidTailCapacity(usize),
    /// The structural self-check found a broken invariant.
    #[error("structural integrity violated: {0}")]
    Integrity(String),
}

/// A persistent vector backed by an RRB trie with a tail buffer.
///
/// The type is generic over [`archery`]'s pointer kinds; use the [`Vector`]
/// alias for the `Rc`-based flavour and [`ThreadSafeVector`] for the
/// `Arc`-based one.
pub struct InternalVector<A: Clone + Debug, P: SharedPointerKind> {
    pub(crate) root: Option<NodeRef<A, P>>,
    pub(crate) shift: usize,
    pub(crate) tail: SharedPointer<Leaf<A, P>, P>,
    pub(crate) len: usize,
}

/// A relaxed radix balanced vector that is cheap to clone and shares
/// structure with every vector derived from it.
pub type Vector<A> = InternalVector<A, RcK>;

/// A [`Vector`] backed by atomically reference-counted pointers, safe to
/// share between threads.
pub type ThreadSafeVector<A> = InternalVector<A, ArcK>;

impl<A: Clone + Debug, P: SharedPointerKind> InternalVector<A, P> {
    /// Constructs a new empty vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v: Vector<u64> = Vector::new();
    /// assert_eq!(v, vector![]);
    /// ```
    pub fn new() -> Self {
        InternalVector {
            root: None,
            shift: 0,
            tail: SharedPointer::new(Leaf::empty()),
            len: 0,
        }
    }

    /// Constructs a new vector with a single element.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = Vector::singleton(1);
    /// assert_eq!(v, vector![1]);
    /// ```
    pub fn singleton(item: A) -> Self {
        InternalVector {
            root: None,
            shift: 0,
            tail: SharedPointer::new(Leaf::with_item(item)),
            len: 1,
        }
    }

    /// Returns the length of the vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rrb_vector::Vector;
    /// let v: Vector<u64> = Vector::new();
    /// assert_eq!(v.len(), 0);
    /// assert_eq!(Vector::singleton(1).len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Tests whether the vector is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rrb_vector::Vector;
    /// let v: Vector<u64> = Vector::new();
    /// assert!(v.is_empty());
    /// assert!(!Vector::singleton(1).is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tail_len(&self) -> usize {
        self.tail.len()
    }

    fn trie_len(&self) -> usize {
        self.len - self.tail_len()
    }

    /// Gets a reference to the element at the given index.
    ///
    /// Returns `None` if the index does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = vector![10, 20, 30];
    /// assert_eq!(v.get(1), Some(&20));
    /// assert_eq!(v.get(3), None);
    /// ```
    pub fn get(&self, index: usize) -> Option<&A> {
        if index >= self.len {
            return None;
        }
        let trie_len = self.trie_len();
        if index < trie_len {
            Some(self.root.as_ref().unwrap().get(self.shift, index))
        } else {
            self.tail.elements.get(index - trie_len)
        }
    }

    /// Gets a reference to the first element of the vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = vector![10, 20, 30];
    /// assert_eq!(v.front(), Some(&10));
    /// ```
    pub fn front(&self) -> Option<&A> {
        self.get(0)
    }

    /// Gets a reference to the last element of the vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = vector![10, 20, 30];
    /// assert_eq!(v.back(), Some(&30));
    /// ```
    pub fn back(&self) -> Option<&A> {
        self.get(self.len.checked_sub(1)?)
    }

    /// Returns the leaf slice covering `index` along with the absolute index
    /// of the slice's first element.
    fn chunk_at(&self, index: usize) -> (&[A], usize) {
        let trie_len = self.trie_len();
        if index >= trie_len {
            (self.tail.elements.as_slice(), trie_len)
        } else {
            let (leaf, offset) = self
                .root
                .as_ref()
                .unwrap()
                .leaf_containing(self.shift, index);
            (leaf.elements.as_slice(), index - offset)
        }
    }

    /// Attempts to replace the element at the given index.
    ///
    /// Returns an error if the index does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3];
    /// assert!(v.try_set(0, 10).is_ok());
    /// assert!(v.try_set(3, 40).is_err());
    /// assert_eq!(v, vector![10, 2, 3]);
    /// ```
    pub fn try_set(&mut self, index: usize, value: A) -> Result<(), VectorError> {
        if index >= self.len {
            return Err(VectorError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let trie_len = self.trie_len();
        if index < trie_len {
            self.root
                .as_mut()
                .unwrap()
                .update(self.shift, index, value, None);
        } else {
            let tail = Leaf::edit(&mut self.tail, None);
            *tail.elements.get_mut(index - trie_len).unwrap() = value;
        }
        Ok(())
    }

    /// Replaces the element at the given index.
    ///
    /// Panics if the index does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = vector![1, 2, 3];
    /// let mut w = v.clone();
    /// w.set(1, 999);
    /// assert_eq!(v.get(1), Some(&2));
    /// assert_eq!(w.get(1), Some(&999));
    /// ```
    pub fn set(&mut self, index: usize, value: A) {
        self.try_set(index, value).unwrap()
    }

    /// Appends an element to the back of the vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2];
    /// v.push_back(3);
    /// assert_eq!(v, vector![1, 2, 3]);
    /// ```
    pub fn push_back(&mut self, item: A) {
        if self.tail.is_full() {
            let full = mem::replace(&mut self.tail, SharedPointer::new(Leaf::with_item(item)));
            push_leaf_into_trie(&mut self.root, &mut self.shift, full, None);
        } else {
            Leaf::edit(&mut self.tail, None).elements.push_back(item);
        }
        self.len += 1;
    }

    /// Removes and returns the last element of the vector.
    ///
    /// Returns `None` if the vector is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3];
    /// assert_eq!(v.pop_back(), Some(3));
    /// assert_eq!(v, vector![1, 2]);
    /// ```
    pub fn pop_back(&mut self) -> Option<A> {
        if self.len == 0 {
            return None;
        }
        if self.tail.is_empty() {
            self.promote_tail();
        }
        let item = Leaf::edit(&mut self.tail, None).elements.pop_back();
        self.len -= 1;
        if self.tail.is_empty() && self.root.is_some() {
            self.promote_tail();
        }
        Some(item)
    }

    /// Removes and returns the last element of the vector.
    ///
    /// Returns an error if the vector is empty.
    pub fn try_pop_back(&mut self) -> Result<A, VectorError> {
        self.pop_back().ok_or(VectorError::EmptyVector)
    }

    /// Removes and returns the first element of the vector.
    ///
    /// Returns `None` if the vector is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3];
    /// assert_eq!(v.pop_front(), Some(1));
    /// assert_eq!(v, vector![2, 3]);
    /// ```
    pub fn pop_front(&mut self) -> Option<A> {
        if self.len == 0 {
            return None;
        }
        let item = self.get(0).unwrap().clone();
        self.try_slice_to_end(1).unwrap();
        Some(item)
    }

    /// Removes and returns the first element of the vector.
    ///
    /// Returns an error if the vector is empty.
    pub fn try_pop_front(&mut self) -> Result<A, VectorError> {
        self.pop_front().ok_or(VectorError::EmptyVector)
    }

    /// Attempts to insert an element before the given index, shifting
    /// everything after it one position to the right.
    ///
    /// Returns an error if the index is greater than the length.
    pub fn try_insert(&mut self, index: usize, value: A) -> Result<(), VectorError> {
        if index > self.len {
            return Err(VectorError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        if index == self.len {
            self.push_back(value);
            return Ok(());
        }
        let trie_len = self.trie_len();
        if index >= trie_len {
            if self.tail.is_full() {
                // Make room by pushing a full leaf down; the spliced tail
                // keeps the first WIDTH elements and the one that fell off
                // the end seeds the new tail.
                let tail = Leaf::edit(&mut self.tail, None);
                let overflow = tail.elements.pop_back();
                tail.elements.insert(index - trie_len, value);
                let full =
                    mem::replace(&mut self.tail, SharedPointer::new(Leaf::with_item(overflow)));
                push_leaf_into_trie(&mut self.root, &mut self.shift, full, None);
            } else {
                Leaf::edit(&mut self.tail, None)
                    .elements
                    .insert(index - trie_len, value);
            }
        } else {
            match insert_in(self.root.as_ref().unwrap(), self.shift, index, value) {
                InsertResult::Fit(node) => self.root = Some(node),
                InsertResult::Split(first, second) => {
                    let mut children = Buffer::new();
                    children.push_back(first);
                    children.push_back(second);
                    self.shift += BITS;
                    self.root = Some(crate::nodes::make_branch(children, self.shift, None));
                }
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Inserts an element before the given index.
    ///
    /// Panics if the index is greater than the length.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 3];
    /// v.insert(1, 2);
    /// assert_eq!(v, vector![1, 2, 3]);
    /// ```
    pub fn insert(&mut self, index: usize, value: A) {
        self.try_insert(index, value).unwrap()
    }

    /// Attempts to remove and return the element at the given index,
    /// shifting everything after it one position to the left.
    ///
    /// Returns an error if the index does not exist.
    pub fn try_remove(&mut self, index: usize) -> Result<A, VectorError> {
        if index >= self.len {
            return Err(VectorError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let trie_len = self.trie_len();
        let value = if index >= trie_len {
            Leaf::edit(&mut self.tail, None)
                .elements
                .remove(index - trie_len)
        } else {
            let root = self.root.take().unwrap();
            let (rest, value) = remove_in(&root, self.shift, index);
            self.root = rest;
            self.normalize();
            value
        };
        self.len -= 1;
        if self.tail.is_empty() && self.root.is_some() {
            self.promote_tail();
        }
        Ok(value)
    }

    /// Removes and returns the element at the given index.
    ///
    /// Panics if the index does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3];
    /// assert_eq!(v.remove(1), 2);
    /// assert_eq!(v, vector![1, 3]);
    /// ```
    pub fn remove(&mut self, index: usize) -> A {
        self.try_remove(index).unwrap()
    }

    /// Attempts to shorten the vector to its first `new_len` elements.
    ///
    /// Returns an error if `new_len` is greater than the length.
    pub fn try_slice_from_start(&mut self, new_len: usize) -> Result<(), VectorError> {
        if new_len > self.len {
            return Err(VectorError::IndexOutOfBounds {
                index: new_len,
                len: self.len,
            });
        }
        if new_len == self.len {
            return Ok(());
        }
        let trie_len = self.trie_len();
        if new_len > trie_len {
            Leaf::edit(&mut self.tail, None)
                .elements
                .truncate(new_len - trie_len);
        } else if new_len == trie_len {
            self.tail = SharedPointer::new(Leaf::empty());
        } else {
            self.tail = SharedPointer::new(Leaf::empty());
            if new_len == 0 {
                self.root = None;
                self.shift = 0;
            } else {
                let root = self.root.take().unwrap();
                self.root = Some(slice_right(&root, self.shift, new_len));
                self.normalize();
            }
        }
        self.len = new_len;
        Ok(())
    }

    /// Shortens the vector to its first `new_len` elements.
    ///
    /// Panics if `new_len` is greater than the length.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3, 4, 5];
    /// v.slice_from_start(2);
    /// assert_eq!(v, vector![1, 2]);
    /// ```
    pub fn slice_from_start(&mut self, new_len: usize) {
        self.try_slice_from_start(new_len).unwrap()
    }

    /// Attempts to drop the first `from` elements of the vector.
    ///
    /// Returns an error if `from` is greater than the length.
    pub fn try_slice_to_end(&mut self, from: usize) -> Result<(), VectorError> {
        if from > self.len {
            return Err(VectorError::IndexOutOfBounds {
                index: from,
                len: self.len,
            });
        }
        if from == 0 {
            return Ok(());
        }
        if from == self.len {
            *self = InternalVector::new();
            return Ok(());
        }
        let trie_len = self.trie_len();
        if from >= trie_len {
            if from > trie_len {
                let elements =
                    Buffer::from_slice(&self.tail.elements.as_slice()[from - trie_len..]);
                self.tail = SharedPointer::new(Leaf::from_buffer(elements));
            }
            self.root = None;
            self.shift = 0;
        } else {
            let root = self.root.take().unwrap();
            self.root = Some(slice_left(&root, self.shift, from));
            self.normalize();
        }
        self.len -= from;
        Ok(())
    }

    /// Drops the first `from` elements of the vector.
    ///
    /// Panics if `from` is greater than the length.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3, 4, 5];
    /// v.slice_to_end(3);
    /// assert_eq!(v, vector![4, 5]);
    /// ```
    pub fn slice_to_end(&mut self, from: usize) {
        self.try_slice_to_end(from).unwrap()
    }

    /// Attempts to reduce the vector to the given contiguous range.
    ///
    /// Returns an error if the range is inverted or reaches past the end.
    pub fn try_slice(&mut self, range: Range<usize>) -> Result<(), VectorError> {
        if range.end > self.len {
            return Err(VectorError::IndexOutOfBounds {
                index: range.end,
                len: self.len,
            });
        }
        if range.start > range.end {
            return Err(VectorError::IndexOutOfBounds {
                index: range.start,
                len: self.len,
            });
        }
        self.try_slice_from_start(range.end)?;
        self.try_slice_to_end(range.start)
    }

    /// Reduces the vector to the given contiguous range.
    ///
    /// Panics if the range is inverted or reaches past the end.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rrb_vector::Vector;
    /// let mut v: Vector<usize> = (0..100).collect();
    /// v.slice(2..7);
    /// assert_eq!(v.len(), 5);
    /// assert_eq!(v.get(0), Some(&2));
    /// assert_eq!(v.get(4), Some(&6));
    /// ```
    pub fn slice(&mut self, range: Range<usize>) {
        self.try_slice(range).unwrap()
    }

    /// Attempts to split the vector in two at the given index. The receiver
    /// keeps the first `at` elements and the rest are returned.
    ///
    /// Returns an error if `at` is greater than the length.
    pub fn try_split_off(&mut self, at: usize) -> Result<Self, VectorError> {
        if at > self.len {
            return Err(VectorError::IndexOutOfBounds {
                index: at,
                len: self.len,
            });
        }
        if at == 0 {
            return Ok(mem::replace(self, InternalVector::new()));
        }
        if at == self.len {
            return Ok(InternalVector::new());
        }
        let trie_len = self.trie_len();
        let right_len = self.len - at;
        let right = if at >= trie_len {
            let offset = at - trie_len;
            let right_elements = Leaf::edit(&mut self.tail, None).elements.split_off(offset);
            InternalVector {
                root: None,
                shift: 0,
                tail: SharedPointer::new(Leaf::from_buffer(right_elements)),
                len: right_len,
            }
        } else {
            let root = self.root.take().unwrap();
            let (left_piece, right_piece) = split(&root, self.shift, at);
            let mut right = InternalVector {
                root: right_piece,
                shift: self.shift,
                tail: mem::replace(&mut self.tail, SharedPointer::new(Leaf::empty())),
                len: right_len,
            };
            right.normalize();
            self.root = left_piece;
            self.normalize();
            right
        };
        self.len = at;
        if self.tail.is_empty() && self.root.is_some() {
            self.promote_tail();
        }
        Ok(right)
    }

    /// Splits the vector in two at the given index. The receiver keeps the
    /// first `at` elements and the rest are returned.
    ///
    /// Panics if `at` is greater than the length.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2, 3, 4];
    /// let w = v.split_off(2);
    /// assert_eq!(v, vector![1, 2]);
    /// assert_eq!(w, vector![3, 4]);
    /// ```
    pub fn split_off(&mut self, at: usize) -> Self {
        self.try_split_off(at).unwrap()
    }

    /// Moves every element of `other` to the back of this vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let mut v = vector![1, 2];
    /// v.append(vector![3, 4]);
    /// assert_eq!(v, vector![1, 2, 3, 4]);
    /// ```
    pub fn append(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        if self.root.is_none()
            && other.root.is_none()
            && self.tail_len() + other.tail_len() <= WIDTH
        {
            let tail = Leaf::edit(&mut self.tail, None);
            for item in other.tail.elements.iter() {
                tail.elements.push_back(item.clone());
            }
            self.len += other.len;
            return;
        }
        if !self.tail.is_empty() {
            let tail = mem::replace(&mut self.tail, SharedPointer::new(Leaf::empty()));
            push_leaf_into_trie(&mut self.root, &mut self.shift, tail, None);
        }
        if let Some(right) = &other.root {
            let left = self
                .root
                .as_ref()
                .expect("a non-empty vector has a trie once its tail is flushed");
            let (root, shift) = concat_trees(left, self.shift, right, other.shift);
            self.root = Some(root);
            self.shift = shift;
            self.normalize();
        }
        self.tail = other.tail;
        self.len += other.len;
    }

    /// Creates an iterator over the elements of the vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = vector![1, 2, 3];
    /// assert_eq!(v.iter().sum::<u64>(), 6);
    /// ```
    pub fn iter(&self) -> Iter<'_, A, P> {
        Iter {
            vector: self,
            front: 0,
            back: self.len,
            front_chunk: None,
            back_chunk: None,
        }
    }

    /// Creates a transient copy of the vector that supports destructive
    /// updates without affecting this vector. See
    /// [`transient`](crate::transient).
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate rrb_vector;
    /// # use rrb_vector::Vector;
    /// let v = vector![1, 2, 3];
    /// let mut t = v.to_transient();
    /// t.set(0, 10);
    /// t.push_back(4);
    /// assert_eq!(v, vector![1, 2, 3]);
    /// assert_eq!(t.to_persistent(), vector![10, 2, 3, 4]);
    /// ```
    pub fn to_transient(&self) -> InternalTransient<A, P> {
        InternalTransient::from_vector(self)
    }

    /// Verifies the structural invariants of the vector: node heights, size
    /// tables, the dense-child rule, the collapsed root and the element
    /// count. Intended for tests and debugging; operations keep these
    /// invariants without help.
    pub fn check_invariants(&self) -> Result<(), VectorError> {
        if self.shift % BITS != 0 {
            return Err(VectorError::Integrity(format!(
                "shift {} is not a multiple of {}",
                self.shift, BITS
            )));
        }
        if self.shift > MAX_HEIGHT * BITS {
            return Err(VectorError::Integrity(format!(
                "shift {} exceeds the height bound",
                self.shift
            )));
        }
        let trie_count = match &self.root {
            Some(node) => check_node(node, self.shift, true).map_err(VectorError::Integrity)?,
            None => {
                if self.shift != 0 {
                    return Err(VectorError::Integrity(
                        "vector with no trie has a non-zero shift".to_owned(),
                    ));
                }
                0
            }
        };
        if trie_count + self.tail_len() != self.len {
            return Err(VectorError::Integrity(format!(
                "trie holds {} elements and the tail {}, but the vector claims {}",
                trie_count,
                self.tail_len(),
                self.len
            )));
        }
        Ok(())
    }

    /// Collapses trivial roots: a root with a single child hands its role to
    /// the child. Keeping the root non-trivial is what the dense indexing
    /// arithmetic and the concatenation planner assume.
    fn normalize(&mut self) {
        loop {
            match &self.root {
                Some(NodeRef::Branch(branch)) if branch.len() == 1 => {
                    let child = branch.children.front().unwrap().clone();
                    self.shift -= BITS;
                    self.root = Some(child);
                }
                _ => break,
            }
        }
        if self.root.is_none() {
            self.shift = 0;
        }
    }

    /// Refills the empty tail by extracting the rightmost leaf of the trie.
    fn promote_tail(&mut self) {
        let root = self.root.take().expect("tail promotion requires a trie");
        let (rest, leaf) = take_last_leaf(&root, self.shift);
        self.tail = leaf;
        self.root = rest;
        self.normalize();
    }

    #[cfg(test)]
    pub(crate) fn equal_vec(&self, v: &[A]) -> bool
    where
        A: PartialEq,
    {
        self.len() == v.len() && self.iter().eq(v.iter())
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> Clone for InternalVector<A, P> {
    fn clone(&self) -> Self {
        InternalVector {
            root: self.root.clone(),
            shift: self.shift,
            tail: self.tail.clone(),
            len: self.len,
        }
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> Default for InternalVector<A, P> {
    fn default() -> Self {
        InternalVector::new()
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> Debug for InternalVector<A, P> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        fmt.debug_list().entries(self.iter()).finish()
    }
}

impl<A: Clone + Debug + PartialEq, P: SharedPointerKind> PartialEq for InternalVector<A, P> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<A: Clone + Debug + Eq, P: SharedPointerKind> Eq for InternalVector<A, P> {}

impl<A: Clone + Debug + Hash, P: SharedPointerKind> Hash for InternalVector<A, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for item in self.iter() {
            item.hash(state);
        }
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> FromIterator<A> for InternalVector<A, P> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let mut transient = InternalTransient::with_tail_capacity(BULK_TAIL_CAPACITY)
            .expect("the bulk tail capacity is a multiple of the branching factor");
        for item in iter {
            transient.push_back(item);
        }
        transient.to_persistent()
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> Extend<A> for InternalVector<A, P> {
    fn extend<I: IntoIterator<Item = A>>(&mut self, iter: I) {
        let mut transient = self.to_transient();
        for item in iter {
            transient.push_back(item);
        }
        *self = transient.to_persistent();
    }
}

/// An iterator over a vector that is obtained by the [`InternalVector::iter`]
/// method.
///
/// The iterator caches the leaf it is currently reading from, so stepping
/// costs O(1) except every `WIDTH` steps when the next leaf is fetched.
pub struct Iter<'a, A: Clone + Debug, P: SharedPointerKind> {
    vector: &'a InternalVector<A, P>,
    front: usize,
    back: usize,
    front_chunk: Option<(&'a [A], usize)>,
    back_chunk: Option<(&'a [A], usize)>,
}

impl<'a, A: Clone + Debug, P: SharedPointerKind> Iterator for Iter<'a, A, P> {
    type Item = &'a A;

    fn next(&mut self) -> Option<&'a A> {
        if self.front == self.back {
            return None;
        }
        let miss = match self.front_chunk {
            Some((slice, start)) => self.front < start || self.front >= start + slice.len(),
            None => true,
        };
        if miss {
            self.front_chunk = Some(self.vector.chunk_at(self.front));
        }
        let (slice, start) = self.front_chunk.unwrap();
        let item = &slice[self.front - start];
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, A: Clone + Debug, P: SharedPointerKind> DoubleEndedIterator for Iter<'a, A, P> {
    fn next_back(&mut self) -> Option<&'a A> {
        if self.front == self.back {
            return None;
        }
        let index = self.back - 1;
        let miss = match self.back_chunk {
            Some((slice, start)) => index < start || index >= start + slice.len(),
            None => true,
        };
        if miss {
            self.back_chunk = Some(self.vector.chunk_at(index));
        }
        let (slice, start) = self.back_chunk.unwrap();
        self.back = index;
        Some(&slice[index - start])
    }
}

impl<'a, A: Clone + Debug, P: SharedPointerKind> ExactSizeIterator for Iter<'a, A, P> {}

impl<'a, A: Clone + Debug, P: SharedPointerKind> FusedIterator for Iter<'a, A, P> {}

impl<'a, A: Clone + Debug, P: SharedPointerKind> IntoIterator for &'a InternalVector<A, P> {
    type IntoIter = Iter<'a, A, P>;
    type Item = &'a A;

    fn into_iter(self) -> Iter<'a, A, P> {
        self.iter()
    }
}

/// A consuming iterator over a vector that is obtained by the
/// [`IntoIterator`] implementation on [`InternalVector`].
pub struct IntoIter<A: Clone + Debug, P: SharedPointerKind> {
    vector: InternalVector<A, P>,
    front: usize,
    back: usize,
}

impl<A: Clone + Debug, P: SharedPointerKind> Iterator for IntoIter<A, P> {
    type Item = A;

    fn next(&mut self) -> Option<A> {
        if self.front == self.back {
            return None;
        }
        let item = self.vector.get(self.front).cloned();
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> DoubleEndedIterator for IntoIter<A, P> {
    fn next_back(&mut self) -> Option<A> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.vector.get(self.back).cloned()
    }
}

impl<A: Clone + Debug, P: SharedPointerKind> ExactSizeIterator for IntoIter<A, P> {}

impl<A: Clone + Debug, P: SharedPointerKind> FusedIterator for IntoIter<A, P> {}

impl<A: Clone + Debug, P: SharedPointerKind> IntoIterator for InternalVector<A, P> {
    type IntoIter = IntoIter<A, P>;
    type Item = A;

    fn into_iter(self) -> IntoIter<A, P> {
        let len = self.len;
        IntoIter {
            vector: self,
            front: 0,
            back: len,
        }
    }
}
