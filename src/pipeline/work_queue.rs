//! Blocking FIFO shared between the render thread and pipeline threads.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// An entry on a [`WorkQueue`].
#[derive(Debug, PartialEq, Eq)]
pub enum Message<T> {
    /// A unit of work
    Item(T),
    /// Tells the consumer that takes it to stop
    Stop,
}

/// Unbounded multi-producer, multi-consumer FIFO with blocking dequeue.
///
/// The queue does no deduplication; the same item may be queued any number
/// of times. Consumers decide whether an item still needs work.
#[derive(Debug)]
pub struct WorkQueue<T> {
    entries: Mutex<VecDeque<Message<T>>>,
    available: Condvar,
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append an item and wake one waiting consumer.
    pub fn enqueue(&self, item: T) {
        self.push(Message::Item(item));
    }

    /// Append a stop message and wake one waiting consumer.
    ///
    /// Each consumer exits after taking one stop message, so push one per
    /// consumer. Entries queued after a stop are left for a later consumer.
    pub fn stop(&self) {
        self.push(Message::Stop);
    }

    /// Remove the oldest entry, blocking until one is available.
    pub fn dequeue(&self) -> Message<T> {
        let mut entries = self.lock();
        loop {
            if let Some(message) = entries.pop_front() {
                return message;
            }
            entries = self
                .available
                .wait(entries)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Number of queued entries, stop messages included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, message: Message<T>) {
        self.lock().push_back(message);
        self.available.notify_one();
    }

    // Nothing panics while the lock is held, so a poisoned queue is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Message<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
