//! Background asset loading for cards.
//!
//! The render thread enqueues cards near the selection on a [`WorkQueue`].
//! A single [`LoadDispatcher`] thread pulls them off and hands each one to a
//! bounded [`WorkerPool`] of loader threads. A loader claims the card, decodes
//! its title and animation frames without holding the card lock, commits the
//! result, and signals the render thread through a [`CardReadyListener`].
//!
//! Shutdown pushes a stop message, joins the dispatcher, which in turn waits
//! for every loader thread before returning.

mod counters;
mod dispatcher;
mod error;
mod loader;
mod loader_task;
mod notify;
mod preload;
mod work_queue;
mod worker_pool;

#[cfg(test)]
pub(crate) mod test_support;

pub use counters::{LoadCounters, RunningThread};
pub use dispatcher::LoadDispatcher;
pub use error::PipelineError;
pub use loader::{LoaderPipeline, LoaderSettings};
pub use loader_task::{LoaderContext, load_assets, run_loader_task};
pub use notify::{CardReadyListener, ReadyReceiver, ReadySender, ready_channel};
pub use preload::{PreloadScheduler, preload_window};
pub use work_queue::{Message, WorkQueue};
pub use worker_pool::WorkerPool;
