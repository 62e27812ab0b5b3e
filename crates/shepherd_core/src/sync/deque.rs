//! # Blocking Double-Ended Queue
//!
//! Unbounded FIFO with a blocking pop, used for the transport's outgoing and
//! incoming message queues. Pushing to the front lets a shutdown request jump
//! ahead of everything already queued.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Unbounded blocking deque.
///
/// Producers never block. Consumers may poll, block indefinitely or block
/// with a timeout.
pub struct BlockingDeque<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> BlockingDeque<T> {
    /// Creates an empty deque.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Appends an item at the back.
    pub fn push_back(&self, item: T) {
        self.items.lock().push_back(item);
        self.available.notify_one();
    }

    /// Inserts an item at the front, ahead of everything queued.
    pub fn push_front(&self, item: T) {
        self.items.lock().push_front(item);
        self.available.notify_one();
    }

    /// Removes the front item without blocking.
    #[inline]
    pub fn try_pop_front(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Removes the front item, blocking until one is available.
    pub fn pop_front(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.available.wait(&mut items);
        }
    }

    /// Removes the front item, blocking for at most `timeout`.
    ///
    /// Returns `None` if nothing arrived in time.
    pub fn pop_front_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            if self.available.wait_until(&mut items, deadline).timed_out() {
                return items.pop_front();
            }
        }
    }

    /// Keeps only the items matching the predicate.
    pub fn retain<F>(&self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.items.lock().retain(keep);
    }

    /// Drops every queued item.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// Returns the number of queued items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns true if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T> Default for BlockingDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}
