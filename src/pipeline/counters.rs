//! Process-wide diagnostic counters for the loader pipeline.

use std::sync::{Arc, Mutex, PoisonError};

/// Running pipeline threads and bytes held in decoded bitmaps.
///
/// Each counter has its own lock and neither is ever taken together with a
/// card lock.
#[derive(Debug, Default)]
pub struct LoadCounters {
    threads_running: Mutex<usize>,
    bytes_allocated: Mutex<usize>,
}

impl LoadCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the calling thread as running until the guard is dropped.
    pub fn enter(self: &Arc<Self>) -> RunningThread {
        self.adjust_threads(true);
        RunningThread {
            counters: Arc::clone(self),
        }
    }

    /// Number of pipeline threads currently running.
    pub fn threads_running(&self) -> usize {
        *self
            .threads_running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes currently held in decoded bitmaps.
    pub fn bytes_allocated(&self) -> usize {
        *self
            .bytes_allocated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record newly decoded bitmaps.
    pub fn add_bytes(&self, bytes: usize) {
        {
            let mut allocated = self
                .bytes_allocated
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *allocated += bytes;
        }
        self.log_status();
    }

    /// Record freed bitmaps.
    pub fn release_bytes(&self, bytes: usize) {
        {
            let mut allocated = self
                .bytes_allocated
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *allocated = allocated.saturating_sub(bytes);
        }
        self.log_status();
    }

    /// Log a one-line summary of both counters.
    pub fn log_status(&self) {
        let bytes = self.bytes_allocated();
        log::debug!(
            "Threads: {} - bitmaps: {}MB ({}kB)",
            self.threads_running(),
            bytes / (1024 * 1024),
            bytes / 1024
        );
    }

    fn adjust_threads(&self, started: bool) {
        {
            let mut running = self
                .threads_running
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if started {
                *running += 1;
            } else {
                *running = running.saturating_sub(1);
            }
        }
        self.log_status();
    }
}

/// Keeps a thread counted in [`LoadCounters::threads_running`].
#[derive(Debug)]
pub struct RunningThread {
    counters: Arc<LoadCounters>,
}

impl Drop for RunningThread {
    fn drop(&mut self) {
        self.counters.adjust_threads(false);
    }
}
