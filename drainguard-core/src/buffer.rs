//! Fixed-Capacity Circular Buffer for Reading History
//!
//! ## Overview
//!
//! The anomaly detector needs the most recent readings to compute rolling
//! statistics, but the pipeline runs unattended against an unbounded input
//! stream. A ring buffer gives a sliding window with fixed memory:
//!
//! - O(1) insertion (overwrites oldest when full)
//! - O(1) access to the most recent and to any logical index
//! - O(n) iteration from oldest to newest
//! - one allocation, at construction
//!
//! The capacity is chosen at runtime because it depends on the rolling
//! window of whichever model artifact was loaded.
//!
//! ### Memory Layout
//!
//! ```text
//! CircularBuffer with capacity 5 after 7 pushes (A..G):
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  F  │  G  │  C  │  D  │  E  │  ← physical slots
//! └─────┴─────┴─────┴─────┴─────┘
//!                ↑
//!                └── write_pos = 2 (also the oldest entry once full)
//!
//! Logical view: [C, D, E, F, G]
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use drainguard_core::buffer::CircularBuffer;
//!
//! let mut history = CircularBuffer::with_capacity(3);
//! for level in [40.0, 41.5, 39.8, 38.2] {
//!     history.push(level);
//! }
//!
//! assert_eq!(history.len(), 3);
//! assert_eq!(history.last(), Some(&38.2));
//! assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![41.5, 39.8, 38.2]);
//! ```

/// Fixed-capacity circular buffer
///
/// ## Internal Invariants
///
/// - `write_pos < capacity` (next write position is always valid)
/// - `len <= capacity` (never claim more items than slots)
/// - Items iterate in insertion order
///
/// ## Thread Safety
///
/// Not synchronized. The detector's history is owned by the consumer thread
/// alone, so no locking is needed.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    /// Storage; `None` marks slots not yet written
    data: Vec<Option<T>>,

    /// Index where the next write will occur
    write_pos: usize,

    /// Current number of valid items
    len: usize,
}

impl<T> CircularBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items.
    ///
    /// A capacity of zero is bumped to one so that `push` always keeps the
    /// newest item.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut data = Vec::with_capacity(capacity);
        data.resize_with(capacity, || None);

        Self {
            data,
            write_pos: 0,
            len: 0,
        }
    }

    /// Add an item, overwriting the oldest when full
    pub fn push(&mut self, item: T) {
        let capacity = self.capacity();
        self.data[self.write_pos] = Some(item);
        self.write_pos = (self.write_pos + 1) % capacity;

        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Maximum number of items retained
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most recent item
    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.get(self.len - 1)
    }

    /// Item by logical index (0 = oldest, len-1 = newest)
    ///
    /// When the buffer is not full, logical and physical indices match.
    /// Once full, the oldest item sits at `write_pos`.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < self.capacity() {
            index
        } else {
            (self.write_pos + index) % self.capacity()
        };

        self.data[actual_index].as_ref()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> CircularBufferIter<'_, T> {
        CircularBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Iterate over the newest `n` items, oldest first
    pub fn tail(&self, n: usize) -> CircularBufferIter<'_, T> {
        CircularBufferIter {
            buffer: self,
            index: self.len.saturating_sub(n),
        }
    }
}

/// Iterator over circular buffer contents
pub struct CircularBufferIter<'a, T> {
    buffer: &'a CircularBuffer<T>,
    index: usize,
}

impl<'a, T> Iterator for CircularBufferIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, T> ExactSizeIterator for CircularBufferIter<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer: CircularBuffer<f64> = CircularBuffer::with_capacity(5);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert!(buffer.last().is_none());
        assert_eq!(buffer.capacity(), 5);
    }

    #[test]
    fn zero_capacity_keeps_newest() {
        let mut buffer = CircularBuffer::with_capacity(0);
        buffer.push(1);
        buffer.push(2);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last(), Some(&2));
    }

    #[test]
    fn circular_overwrite() {
        let mut buffer = CircularBuffer::with_capacity(3);

        for i in 0..5 {
            buffer.push(i);
        }

        assert_eq!(buffer.len(), buffer.capacity());

        let values: Vec<i32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![2, 3, 4]);
        assert_eq!(buffer.last(), Some(&4));
    }

    #[test]
    fn tail_window() {
        let mut buffer = CircularBuffer::with_capacity(4);
        for i in 0..6 {
            buffer.push(i);
        }

        assert_eq!(buffer.tail(2).copied().collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(buffer.tail(10).len(), 4);
        assert_eq!(buffer.tail(0).count(), 0);
    }
}
