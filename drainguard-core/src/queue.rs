//! Bounded Drop-Oldest Queue Between Producer and Consumer
//!
//! ## Overview
//!
//! A telemetry source pushes readings from its own thread while the pipeline
//! consumes them from another. The queue is the only synchronization point
//! between the two:
//!
//! ```text
//! Producer (source thread)              Consumer (pipeline thread)
//!      ↓                                      ↓
//!   push() ──── never blocks ──→ [ ring ] ←── pop_timeout() waits ≤ timeout
//!      ↓                                      ↓
//!   full? drop oldest, admit newest       drain() takes everything left
//! ```
//!
//! ## Overflow Policy
//!
//! When full, `push` discards the *oldest* unread item to admit the new one.
//! Fresh readings matter more than complete history for hazard detection,
//! and the producer must never stall on a slow consumer.
//!
//! ## Statistics
//!
//! Counters are atomics updated with `Relaxed` ordering. They are read by
//! the status reporter without taking the queue lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::constants::READING_QUEUE_CAPACITY;

/// Queue statistics
#[derive(Debug, Default)]
pub struct QueueStats {
    /// Total items pushed
    pub pushed: AtomicU64,
    /// Total items popped
    pub popped: AtomicU64,
    /// Items discarded to make room for newer ones
    pub dropped: AtomicU64,
    /// Maximum depth seen
    pub max_depth: AtomicUsize,
}

impl QueueStats {
    /// Plain snapshot of the counters
    pub fn snapshot(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`QueueStats`] at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStatsSnapshot {
    /// Total items pushed
    pub pushed: u64,
    /// Total items popped
    pub popped: u64,
    /// Items discarded on overflow
    pub dropped: u64,
    /// Maximum depth seen
    pub max_depth: usize,
}

/// Bounded FIFO with drop-oldest overflow
///
/// ## Example Usage
///
/// ```rust
/// use drainguard_core::queue::BoundedQueue;
/// use std::time::Duration;
///
/// let queue = BoundedQueue::new(2);
/// queue.push(1);
/// queue.push(2);
/// queue.push(3); // drops 1
///
/// assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(2));
/// assert_eq!(queue.pop_timeout(Duration::from_millis(10)), Some(3));
/// assert_eq!(queue.stats().snapshot().dropped, 1);
/// ```
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
    depth: AtomicUsize,
    stats: QueueStats,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
            depth: AtomicUsize::new(0),
            stats: QueueStats::default(),
        }
    }

    /// Push an item without blocking.
    ///
    /// Returns the item that was dropped to make room, if any.
    pub fn push(&self, item: T) -> Option<T> {
        let mut items = self.lock();

        let dropped = if items.len() >= self.capacity {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            items.pop_front()
        } else {
            None
        };

        items.push_back(item);
        let depth = items.len();
        self.depth.store(depth, Ordering::Relaxed);
        drop(items);

        self.stats.pushed.fetch_add(1, Ordering::Relaxed);
        self.stats.max_depth.fetch_max(depth, Ordering::Relaxed);
        self.available.notify_one();

        dropped
    }

    /// Pop the oldest item, waiting up to `timeout` for one to arrive
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock();

        loop {
            if let Some(item) = items.pop_front() {
                self.depth.store(items.len(), Ordering::Relaxed);
                self.stats.popped.fetch_add(1, Ordering::Relaxed);
                return Some(item);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            let (guard, _) = self
                .available
                .wait_timeout(items, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            items = guard;
        }
    }

    /// Current number of queued items, read without locking
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Check if the queue is empty (lock-free, may be momentarily stale)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue statistics
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Remove and return everything currently queued, oldest first
    pub fn drain(&self) -> Vec<T> {
        let mut items = self.lock();
        let drained: Vec<T> = items.drain(..).collect();
        self.depth.store(0, Ordering::Relaxed);
        self.stats
            .popped
            .fetch_add(drained.len() as u64, Ordering::Relaxed);
        drained
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new(READING_QUEUE_CAPACITY)
    }
}
