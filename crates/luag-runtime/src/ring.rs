//! Bounded ring containers.
//!
//! Two fixed-capacity primitives shared by every stateful component:
//!
//! | Type | Full behaviour | Used by |
//! |------|----------------|---------|
//! | [`BoundedQueue`] | push is rejected, the newest item is dropped | terminal input/output buffers |
//! | [`RingBuffer`] | push evicts the oldest item | scrollback, command history |
//!
//! Capacities are fixed at construction; neither container ever grows past
//! it. A capacity of `0` is clamped to `1`.

use std::collections::VecDeque;

/// Fixed-capacity FIFO queue that refuses new items when full.
///
/// # Example
///
/// ```
/// use luag_runtime::ring::BoundedQueue;
///
/// let mut q = BoundedQueue::new(2);
/// assert!(q.push(b'a').is_ok());
/// assert!(q.push(b'b').is_ok());
/// assert_eq!(q.push(b'c'), Err(b'c'));
/// assert_eq!(q.pop(), Some(b'a'));
/// ```
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue holding at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an item at the back.
    ///
    /// # Errors
    ///
    /// Returns the item back when the queue is full. The queue content is
    /// left untouched.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Removes and returns the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Returns the oldest item without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Fixed-capacity ring that overwrites its oldest item when full.
///
/// Indexing is oldest-first through [`get`](Self::get) and newest-first
/// through [`get_newest`](Self::get_newest).
///
/// # Example
///
/// ```
/// use luag_runtime::ring::RingBuffer;
///
/// let mut ring = RingBuffer::new(2);
/// ring.push("a");
/// ring.push("b");
/// assert_eq!(ring.push("c"), Some("a"));
/// assert_eq!(ring.get(0), Some(&"b"));
/// assert_eq!(ring.get_newest(0), Some(&"c"));
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty ring holding at most `capacity` items.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an item, returning the evicted oldest item if the ring was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Item at `index`, counting from the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Item at `index`, counting from the newest.
    #[must_use]
    pub fn get_newest(&self, index: usize) -> Option<&T> {
        let last = self.items.len().checked_sub(1)?;
        let pos = last.checked_sub(index)?;
        self.items.get(pos)
    }

    /// Iterates oldest-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let mut q = BoundedQueue::new(4);
        for b in b"abc" {
            q.push(*b).expect("queue has room");
        }
        assert_eq!(q.pop(), Some(b'a'));
        assert_eq!(q.pop(), Some(b'b'));
        assert_eq!(q.pop(), Some(b'c'));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn queue_rejects_when_full_and_keeps_content() {
        let mut q = BoundedQueue::new(3);
        for b in b"xyz" {
            q.push(*b).expect("queue has room");
        }
        assert!(q.is_full());
        assert_eq!(q.push(b'!'), Err(b'!'));
        assert_eq!(q.len(), 3);

        let drained: Vec<u8> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(drained, b"xyz");
    }

    #[test]
    fn queue_wraps_after_partial_drain() {
        let mut q = BoundedQueue::new(2);
        q.push(1).expect("room");
        q.push(2).expect("room");
        assert_eq!(q.pop(), Some(1));
        q.push(3).expect("room after pop");
        assert_eq!(q.peek(), Some(&2));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut q = BoundedQueue::new(0);
        assert_eq!(q.capacity(), 1);
        assert!(q.push(()).is_ok());
        assert!(q.push(()).is_err());

        let ring: RingBuffer<u8> = RingBuffer::new(0);
        assert_eq!(ring.capacity(), 1);
    }

    #[test]
    fn ring_overwrites_oldest() {
        let mut ring = RingBuffer::new(3);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), None);
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn ring_newest_indexing() {
        let mut ring = RingBuffer::new(8);
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.get_newest(0), Some(&4));
        assert_eq!(ring.get_newest(4), Some(&0));
        assert_eq!(ring.get_newest(5), None);

        let empty: RingBuffer<i32> = RingBuffer::new(2);
        assert_eq!(empty.get_newest(0), None);
    }

    mod proptest_ring {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Pushing past capacity never changes what is already queued.
            #[test]
            fn queue_saturation_keeps_content(
                cap in 1usize..64,
                data in prop::collection::vec(any::<u8>(), 0..256),
            ) {
                let mut q = BoundedQueue::new(cap);
                for b in &data {
                    let _ = q.push(*b);
                }
                let expected: Vec<u8> = data.iter().copied().take(cap).collect();
                let drained: Vec<u8> = std::iter::from_fn(|| q.pop()).collect();
                prop_assert_eq!(drained, expected);
            }

            /// A ring always holds the newest `capacity` items in order.
            #[test]
            fn ring_keeps_newest_window(
                cap in 1usize..64,
                data in prop::collection::vec(any::<u16>(), 0..256),
            ) {
                let mut ring = RingBuffer::new(cap);
                for v in &data {
                    ring.push(*v);
                }
                let start = data.len().saturating_sub(cap);
                let kept: Vec<u16> = ring.iter().copied().collect();
                prop_assert_eq!(kept, data[start..].to_vec());
            }
        }
    }
}
