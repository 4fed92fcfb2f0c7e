//! Owner of the loader threads.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Preferences;
use crate::data::ImageDecoder;
use crate::model::Card;

use super::{
    CardReadyListener, LoadCounters, LoadDispatcher, LoaderContext, PipelineError, WorkQueue,
    WorkerPool,
};

/// Tuning for the loader threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Maximum number of loader threads
    pub worker_count: usize,
    /// Upper bound on animation frames per card
    pub max_frames: usize,
}

impl From<&Preferences> for LoaderSettings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            worker_count: prefs.worker_count,
            max_frames: prefs.max_frames,
        }
    }
}

/// The running pipeline: request queue, dispatcher thread and loader pool.
///
/// Dropping the pipeline shuts it down and waits for in-flight loads.
pub struct LoaderPipeline {
    queue: Arc<WorkQueue<Arc<Card>>>,
    dispatcher: LoadDispatcher,
    counters: Arc<LoadCounters>,
    stopped: bool,
}

impl LoaderPipeline {
    /// Start the dispatcher thread. Loader threads start on demand.
    ///
    /// `quit` is shared with the render loop; the dispatcher sets it if the
    /// pipeline fails and stops dispatching once it is set.
    pub fn start(
        settings: LoaderSettings,
        decoder: Arc<dyn ImageDecoder>,
        listener: Arc<dyn CardReadyListener>,
        quit: Arc<AtomicBool>,
    ) -> Result<Self, PipelineError> {
        let counters = Arc::new(LoadCounters::new());
        let pool = WorkerPool::new(
            settings.worker_count,
            LoaderContext {
                decoder: Arc::clone(&decoder),
                listener,
                counters: Arc::clone(&counters),
                max_frames: settings.max_frames,
            },
        );
        let queue = Arc::new(WorkQueue::new());
        let dispatcher =
            LoadDispatcher::spawn(Arc::clone(&queue), pool, quit, Arc::clone(&counters))?;

        log::info!(
            "Loader pipeline started: {} decoder, up to {} loader threads, {} frames per card",
            decoder.id(),
            settings.worker_count,
            settings.max_frames
        );

        Ok(Self {
            queue,
            dispatcher,
            counters,
            stopped: false,
        })
    }

    /// The request queue the preload scheduler feeds.
    pub fn queue(&self) -> &WorkQueue<Arc<Card>> {
        &self.queue
    }

    /// Queue one card for loading.
    pub fn enqueue(&self, card: &Arc<Card>) {
        self.queue.enqueue(Arc::clone(card));
    }

    /// Diagnostic counters.
    pub fn counters(&self) -> &Arc<LoadCounters> {
        &self.counters
    }

    /// Stop dispatching and wait for every loader thread to finish.
    ///
    /// Requests still queued behind the stop message are discarded. Safe to
    /// call more than once.
    pub fn shutdown(&mut self) -> Result<(), PipelineError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        log::info!("Stopping loader pipeline");
        self.queue.stop();
        self.dispatcher.join()?;
        self.counters.log_status();
        Ok(())
    }
}

impl Drop for LoaderPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Loader pipeline shutdown failed: {}", e);
        }
    }
}
