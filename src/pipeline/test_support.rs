//! Mock decoder and card helpers shared by the pipeline tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::data::{Bitmap, DecodeError, ImageDecoder};
use crate::model::{Card, CardId};

/// Card whose title is `<archive>.png` and frames `<archive>/<n>.png`.
pub fn test_card(id: CardId, archive: &str) -> Arc<Card> {
    Arc::new(Card::new(
        id,
        archive,
        format!("{}.png", archive),
        format!("{}/{{frame}}.png", archive),
    ))
}

pub fn title_path(archive: &str) -> PathBuf {
    PathBuf::from(format!("{}.png", archive))
}

pub fn frame_path(archive: &str, frame: usize) -> PathBuf {
    PathBuf::from(format!("{}/{}.png", archive, frame))
}

/// Decoder serving 1x1 bitmaps for registered paths.
///
/// Unregistered paths are reported as not found. Every call is counted.
#[derive(Default)]
pub struct MockDecoder {
    images: HashMap<PathBuf, Duration>,
    broken: HashSet<PathBuf>,
    calls: Mutex<HashMap<PathBuf, usize>>,
}

impl MockDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `path` immediately.
    pub fn with_image(self, path: impl Into<PathBuf>) -> Self {
        self.with_slow_image(path, Duration::ZERO)
    }

    /// Serve `path` after sleeping for `delay`.
    pub fn with_slow_image(mut self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.images.insert(path.into(), delay);
        self
    }

    /// Report `path` as malformed.
    pub fn with_broken(mut self, path: impl Into<PathBuf>) -> Self {
        self.broken.insert(path.into());
        self
    }

    /// Number of decode calls for `path`.
    pub fn calls(&self, path: &Path) -> usize {
        self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Number of decode calls overall.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl ImageDecoder for MockDecoder {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn decode(&self, path: &Path) -> Result<Bitmap, DecodeError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_insert(0) += 1;

        if self.broken.contains(path) {
            return Err(DecodeError::Malformed {
                path: path.to_path_buf(),
                message: "corrupt".to_string(),
            });
        }

        match self.images.get(path) {
            Some(delay) => {
                if !delay.is_zero() {
                    thread::sleep(*delay);
                }
                Ok(Bitmap::new(1, 1, vec![0; 4]))
            }
            None => Err(DecodeError::NotFound(path.to_path_buf())),
        }
    }
}
