//! Decoder trait and the decoded bitmap type.

use std::path::{Path, PathBuf};

/// Bytes per RGBA8 pixel.
const BYTES_PER_PIXEL: usize = 4;

/// A decoded image: tightly packed RGBA8 rows.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA pixel data (width * height * 4 bytes)
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap from raw RGBA8 pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * BYTES_PER_PIXEL
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

// Pixel buffers are large; keep debug output to the dimensions.
impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Errors produced while decoding an image file.
///
/// All variants are recoverable: a failed decode only affects the card it
/// belongs to.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The file does not exist
    #[error("{0:?} not found")]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a decodable image
    #[error("failed to decode {path:?}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Decoding would exceed the allocation limit
    #[error("out of memory decoding {0:?}")]
    OutOfMemory(PathBuf),
}

impl DecodeError {
    /// Whether this error only means the file is absent.
    ///
    /// Frame probing ends at the first absent frame, which is not a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DecodeError::NotFound(_))
    }

    /// Path of the file that failed.
    pub fn path(&self) -> &Path {
        match self {
            DecodeError::NotFound(path) | DecodeError::OutOfMemory(path) => path,
            DecodeError::Io { path, .. } | DecodeError::Malformed { path, .. } => path,
        }
    }
}

/// Decodes image files into RGBA8 bitmaps.
///
/// Called concurrently from loader threads. Implementations must not panic on
/// missing or malformed input.
pub trait ImageDecoder: Send + Sync {
    /// Short identifier used in log output.
    fn id(&self) -> &'static str;

    /// Decode the image at `path`.
    fn decode(&self, path: &Path) -> Result<Bitmap, DecodeError>;
}
