//! pimenu - arcade game launcher core
//!
//! A carousel of game cards whose title screenshots and preview animations
//! are decoded on background threads around the current selection and handed
//! back to the render thread by card id.

pub mod app;
pub mod config;
pub mod constants;
pub mod controls;
pub mod data;
pub mod launch;
pub mod model;
pub mod pipeline;
pub mod session;

pub use app::{Launcher, LauncherError};
pub use config::{AppConfig, ConfigError};
pub use controls::{Control, InputEvent};
pub use data::{Bitmap, DecodeError, ImageDecoder, ImageFileDecoder};
pub use launch::LaunchCommand;
pub use model::{Card, CardId, CardStore, LoadStatus};
pub use pipeline::{LoaderPipeline, PipelineError};
pub use session::{SessionError, SessionState};
