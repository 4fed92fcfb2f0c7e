//! Errors raised by the loader pipeline.

/// Fatal pipeline failures. Decode failures are not errors at this level;
/// they only settle the affected card as `LoadStatus::Error`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A pipeline thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The dispatcher thread panicked
    #[error("Load dispatcher thread panicked")]
    DispatcherPanicked,
}
