//! A size table implementation.
//!
//! The size table is a structure for mapping from a position to a child index
//! in an RRB tree. Only relaxed branches carry one; entry `i` holds the total
//! number of elements in children `0..=i`.

use crate::buffer::Buffer;

/// A cumulative table of child sizes for a relaxed node in the RRB tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SizeTable {
    buffer: Buffer<usize>,
}

impl SizeTable {
    /// Construct a new `SizeTable`. The table is initially empty.
    pub fn new() -> Self {
        SizeTable {
            buffer: Buffer::new(),
        }
    }

    /// Construct a table from the sizes of each child in order.
    pub fn from_child_sizes<I: IntoIterator<Item = usize>>(sizes: I) -> Self {
        let mut result = SizeTable::new();
        for size in sizes {
            result.push_child_size(size);
        }
        result
    }

    /// Construct a table directly from cumulative entries in order.
    pub fn from_cumulative<I: IntoIterator<Item = usize>>(entries: I) -> Self {
        let mut buffer = Buffer::new();
        for entry in entries {
            buffer.push_back(entry);
        }
        SizeTable { buffer }
    }

    /// Returns the number of children tracked by the table, not the size of
    /// the node!
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the table tracks no children.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total size of the node.
    pub fn total_size(&self) -> usize {
        self.buffer.back().copied().unwrap_or_default()
    }

    /// Returns the sum of the total sizes of all children up to and including
    /// the given index.
    pub fn get_cumulative_child_size(&self, idx: usize) -> Option<&usize> {
        self.buffer.get(idx)
    }

    /// Returns the size of the child at the given index.
    pub fn get_child_size(&self, idx: usize) -> Option<usize> {
        if idx == 0 {
            self.buffer.get(0).copied()
        } else if idx < self.buffer.len() {
            Some(self.buffer.get(idx).unwrap() - self.buffer.get(idx - 1).unwrap())
        } else {
            None
        }
    }

    /// Returns the position of the child that corresponds to the given index
    /// along with a new index to query in that child.
    pub fn position_info_for(&self, idx: usize) -> Option<(usize, usize)> {
        let mut last = 0;
        for (i, sz) in self.buffer.iter().enumerate() {
            if idx < *sz {
                return Some((i, idx - last));
            }
            last = *sz;
        }
        None
    }

    /// Adds a number of elements to the child at the given index.
    pub fn increment_child_size(&mut self, idx: usize, increment: usize) {
        for entry in self.buffer.as_mut_slice().iter_mut().skip(idx) {
            *entry += increment;
        }
    }

    /// Removes a number of elements from the child at the given index.
    pub fn decrement_child_size(&mut self, idx: usize, decrement: usize) {
        for entry in self.buffer.as_mut_slice().iter_mut().skip(idx) {
            *entry -= decrement;
        }
    }

    /// Adds a number of elements to the last child.
    pub fn increment_last_size(&mut self, increment: usize) {
        let idx = self.len() - 1;
        self.increment_child_size(idx, increment);
    }

    /// Removes a number of elements from the last child.
    pub fn decrement_last_size(&mut self, decrement: usize) {
        let idx = self.len() - 1;
        self.decrement_child_size(idx, decrement);
    }

    /// Appends a new child of the given size to the end of the table.
    pub fn push_child_size(&mut self, size: usize) {
        let total = self.total_size();
        self.buffer.push_back(total + size);
    }

    /// Removes the last child from the table, returning its size.
    pub fn pop_child_size(&mut self) -> usize {
        let last = self.buffer.pop_back();
        last - self.total_size()
    }

    /// Builds the table left behind when the children before `slot` and
    /// `to_drop` elements in total are cut off the front of the node.
    /// `to_drop` must not exceed the cumulative size at `slot`.
    pub fn subtract_prefix(&self, slot: usize, to_drop: usize) -> SizeTable {
        SizeTable::from_cumulative(
            (slot..self.len()).map(|i| self.get_cumulative_child_size(i).unwrap() - to_drop),
        )
    }

    /// Keeps only the entries for the first `new_len` children.
    pub fn truncate(&mut self, new_len: usize) {
        self.buffer.truncate(new_len);
    }

    /// Overwrites the final cumulative entry, which holds the total size.
    pub fn set_total_size(&mut self, total: usize) {
        *self.buffer.back_mut().unwrap() = total;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::WIDTH;

    #[test]
    pub fn empty() {
        let empty = SizeTable::new();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.total_size(), 0);
        assert_eq!(empty.position_info_for(0), None);
    }

    #[test]
    pub fn linear() {
        let mut linear = SizeTable::new();
        for i in 1..=WIDTH {
            linear.push_child_size(i);
        }

        assert_eq!(linear.len(), WIDTH);
        assert_eq!(linear.total_size(), WIDTH * (WIDTH + 1) / 2);

        for i in 1..=WIDTH {
            assert_eq!(
                *linear.get_cumulative_child_size(i - 1).unwrap(),
                i * (i + 1) / 2
            );
            assert_eq!(linear.get_child_size(i - 1).unwrap(), i);
        }

        // Index 0 lands in the first child, the total-minus-one in the last.
        assert_eq!(linear.position_info_for(0), Some((0, 0)));
        assert_eq!(linear.position_info_for(1), Some((1, 0)));
        assert_eq!(linear.position_info_for(2), Some((1, 1)));
        assert_eq!(
            linear.position_info_for(linear.total_size() - 1),
            Some((WIDTH - 1, WIDTH - 1))
        );
        assert_eq!(linear.position_info_for(linear.total_size()), None);

        assert_eq!(linear.pop_child_size(), WIDTH);
        assert_eq!(linear.len(), WIDTH - 1);
    }

    #[test]
    pub fn constant() {
        let k = 10;
        let mut constant = SizeTable::from_child_sizes(std::iter::repeat(k).take(WIDTH));

        assert_eq!(constant.len(), WIDTH);
        assert_eq!(constant.total_size(), WIDTH * k);
        for i in 0..WIDTH {
            assert_eq!(constant.get_child_size(i).unwrap(), k);
            assert_eq!(constant.position_info_for(i * k + 3), Some((i, 3)));
        }

        constant.increment_last_size(2);
        assert_eq!(constant.total_size(), WIDTH * k + 2);
        assert_eq!(constant.get_child_size(WIDTH - 1).unwrap(), k + 2);

        constant.decrement_last_size(2);
        assert_eq!(constant.total_size(), WIDTH * k);

        constant.increment_child_size(0, 5);
        assert_eq!(constant.get_child_size(0).unwrap(), k + 5);
        assert_eq!(constant.get_child_size(1).unwrap(), k);
        assert_eq!(constant.total_size(), WIDTH * k + 5);

        constant.truncate(4);
        constant.set_total_size(constant.total_size() - 3);
        assert_eq!(constant.len(), 4);
        assert_eq!(constant.get_child_size(3).unwrap(), k - 3);
    }

    #[test]
    pub fn subtract_prefix() {
        let table = SizeTable::from_child_sizes([7, 32, 32, 5]);

        // Cutting inside the second child drops the first child's entry and
        // rebases the rest.
        let inside = table.subtract_prefix(1, 10);
        assert_eq!(inside.len(), 3);
        assert_eq!(inside.get_child_size(0).unwrap(), 29);
        assert_eq!(inside.get_child_size(1).unwrap(), 32);
        assert_eq!(inside.get_child_size(2).unwrap(), 5);
        assert_eq!(inside.total_size(), table.total_size() - 10);

        // Cutting on a child boundary keeps the remaining sizes intact.
        let boundary = table.subtract_prefix(1, 7);
        assert_eq!(boundary.len(), 3);
        assert_eq!(boundary.get_child_size(0).unwrap(), 32);
        assert_eq!(boundary.total_size(), table.total_size() - 7);

        // A no-op cut reproduces the table.
        assert_eq!(table.subtract_prefix(0, 0), table);
    }
}
