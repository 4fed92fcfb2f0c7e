//! The load dispatcher thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::model::Card;

use super::{LoadCounters, Message, PipelineError, WorkQueue, WorkerPool};

/// Single long-lived thread moving cards from the request queue to the
/// loader pool.
///
/// The dispatcher never waits on a load. It exits when it takes a stop
/// message, when the shared quit flag is set, or when the pool cannot start
/// a thread; the last case also sets the quit flag so the render loop shuts
/// down. On exit it waits for every loader thread to finish.
pub struct LoadDispatcher {
    handle: Option<JoinHandle<()>>,
}

impl LoadDispatcher {
    /// Start the dispatcher thread. The pool moves into the thread.
    pub fn spawn(
        queue: Arc<WorkQueue<Arc<Card>>>,
        pool: WorkerPool,
        quit: Arc<AtomicBool>,
        counters: Arc<LoadCounters>,
    ) -> Result<Self, PipelineError> {
        let handle = thread::Builder::new()
            .name("load-dispatcher".to_string())
            .spawn(move || {
                let _running = counters.enter();
                log::info!("Load dispatcher started");
                Self::thread_loop(&queue, pool, &quit);
                log::info!("Load dispatcher exiting");
            })
            .map_err(|source| PipelineError::Spawn {
                name: "load-dispatcher".to_string(),
                source,
            })?;

        Ok(Self {
            handle: Some(handle),
        })
    }

    /// Dispatcher main loop.
    fn thread_loop(queue: &WorkQueue<Arc<Card>>, mut pool: WorkerPool, quit: &AtomicBool) {
        loop {
            match queue.dequeue() {
                Message::Item(card) => {
                    if quit.load(Ordering::Acquire) {
                        log::debug!("Quit requested, not dispatching card {}", card.id);
                        break;
                    }
                    log::trace!("Dispatching card {} ({})", card.id, card.archive);
                    if let Err(e) = pool.submit(card) {
                        log::error!("{}", e);
                        quit.store(true, Ordering::Release);
                        break;
                    }
                }
                Message::Stop => {
                    log::debug!("Received stop signal");
                    break;
                }
            }
        }

        // Loads already handed to the pool run to completion
        pool.shutdown();
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the dispatcher and all loader threads to exit.
    ///
    /// Does not send the stop message itself. Calling it again after a
    /// successful join is a no-op.
    pub fn join(&mut self) -> Result<(), PipelineError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| PipelineError::DispatcherPanicked),
            None => Ok(()),
        }
    }
}
