//! Bounded pool of long-lived loader threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crate::model::Card;

use super::{LoaderContext, Message, PipelineError, WorkQueue, run_loader_task};

/// Loader threads consuming a shared job queue.
///
/// A thread is started only when every running thread already has an
/// unfinished job, and never beyond `capacity`. After that, jobs wait in the
/// queue for the next free thread.
pub struct WorkerPool {
    jobs: Arc<WorkQueue<Arc<Card>>>,
    /// Jobs submitted and not yet finished
    pending: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
    capacity: usize,
    context: Arc<LoaderContext>,
}

impl WorkerPool {
    /// Create a pool that runs at most `capacity` loader threads.
    pub fn new(capacity: usize, context: LoaderContext) -> Self {
        Self {
            jobs: Arc::new(WorkQueue::new()),
            pending: Arc::new(AtomicUsize::new(0)),
            workers: Vec::new(),
            capacity: capacity.max(1),
            context: Arc::new(context),
        }
    }

    /// Number of loader threads started so far.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of submitted jobs that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Queue a card for loading.
    ///
    /// Starts another thread if there are more unfinished jobs than threads
    /// and the pool is below capacity. Fails only if that thread cannot be
    /// spawned.
    pub fn submit(&mut self, card: Arc<Card>) -> Result<(), PipelineError> {
        let pending = self.pending.fetch_add(1, Ordering::AcqRel) + 1;
        self.jobs.enqueue(card);
        if pending > self.workers.len() && self.workers.len() < self.capacity {
            self.spawn_worker()?;
        }
        Ok(())
    }

    /// Let the threads finish every queued job, then join them.
    ///
    /// Returns the number of threads that panicked.
    pub fn shutdown(&mut self) -> usize {
        for _ in &self.workers {
            self.jobs.stop();
        }

        let mut panicked = 0;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            log::warn!("{} loader threads panicked", panicked);
        }
        panicked
    }

    fn spawn_worker(&mut self) -> Result<(), PipelineError> {
        let index = self.workers.len();
        let name = format!("card-loader-{}", index);
        let jobs = Arc::clone(&self.jobs);
        let pending = Arc::clone(&self.pending);
        let context = Arc::clone(&self.context);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _running = context.counters.enter();
                log::debug!("Loader thread {} started", index);
                while let Message::Item(card) = jobs.dequeue() {
                    run_loader_task(&card, &context);
                    pending.fetch_sub(1, Ordering::AcqRel);
                }
                log::debug!("Loader thread {} exiting", index);
            })
            .map_err(|source| PipelineError::Spawn { name, source })?;

        self.workers.push(handle);
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoadStatus;
    use crate::pipeline::test_support::{MockDecoder, test_card, title_path};
    use crate::pipeline::{LoadCounters, ready_channel};
    use std::time::{Duration, Instant};

    fn pool(capacity: usize, decoder: MockDecoder) -> (WorkerPool, Arc<LoadCounters>, Arc<MockDecoder>) {
        let decoder = Arc::new(decoder);
        let counters = Arc::new(LoadCounters::new());
        let (tx, _rx) = ready_channel();
        let context = LoaderContext {
            decoder: decoder.clone(),
            listener: Arc::new(tx),
            counters: counters.clone(),
            max_frames: 4,
        };
        (WorkerPool::new(capacity, context), counters, decoder)
    }

    fn slow_titles(count: usize, delay: Duration) -> MockDecoder {
        let mut decoder = MockDecoder::new();
        for id in 0..count {
            decoder = decoder.with_slow_image(title_path(&format!("game{}", id)), delay);
        }
        decoder
    }

    #[test]
    fn test_grows_up_to_capacity() {
        let (mut pool, _, _) = pool(2, slow_titles(5, Duration::from_millis(100)));
        for id in 0..5 {
            pool.submit(test_card(id, &format!("game{}", id))).unwrap();
        }
        assert_eq!(pool.worker_count(), 2);
        pool.shutdown();
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_idle_worker_is_reused() {
        let (mut pool, _, _) = pool(4, MockDecoder::new());
        for id in 0..5 {
            let card = test_card(id, &format!("game{}", id));
            pool.submit(card.clone()).unwrap();

            let deadline = Instant::now() + Duration::from_secs(5);
            while (!card.status().is_settled() || pool.pending() > 0)
                && Instant::now() < deadline
            {
                thread::sleep(Duration::from_millis(1));
            }
            assert_eq!(pool.pending(), 0);
        }
        assert_eq!(pool.worker_count(), 1);
        pool.shutdown();
    }

    #[test]
    fn test_shutdown_drains_queued_jobs() {
        let mut decoder = MockDecoder::new();
        for id in 0..6 {
            decoder = decoder.with_slow_image(title_path(&format!("game{}", id)), Duration::from_millis(20));
        }
        let (mut pool, counters, _) = pool(1, decoder);

        let cards: Vec<_> = (0..6).map(|id| test_card(id, &format!("game{}", id))).collect();
        for card in &cards {
            pool.submit(card.clone()).unwrap();
        }
        assert_eq!(pool.shutdown(), 0);

        for card in &cards {
            assert_eq!(card.status(), LoadStatus::Loaded);
        }
        assert_eq!(counters.threads_running(), 0);
    }

    #[test]
    fn test_zero_capacity_still_runs_one_thread() {
        let (mut pool, _, decoder) = pool(0, MockDecoder::new().with_image(title_path("sf2")));
        let card = test_card(0, "sf2");
        pool.submit(card.clone()).unwrap();
        pool.shutdown();

        assert_eq!(card.status(), LoadStatus::Loaded);
        assert_eq!(decoder.calls(&title_path("sf2")), 1);
    }
}
