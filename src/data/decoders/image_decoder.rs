//! Decoder for standard image formats (PNG, JPEG, BMP, TIFF, WebP).
//!
//! Converts every image to RGBA8 and optionally flips rows so the first row
//! in memory is the bottom of the picture, the layout GL texture upload expects.

use std::io::ErrorKind;
use std::path::Path;

use image::{ImageError, ImageReader, Limits};

use crate::data::{Bitmap, DecodeError, ImageDecoder};

/// Decoder backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageFileDecoder {
    /// Store rows bottom-up
    flip_vertical: bool,
    /// Allocation and dimension limits applied to every decode
    limits: Limits,
}

impl ImageFileDecoder {
    /// Create a decoder with the `image` crate's default limits.
    pub fn new(flip_vertical: bool) -> Self {
        Self {
            flip_vertical,
            limits: Limits::default(),
        }
    }

    /// Cap the memory a single decode may allocate.
    ///
    /// Exceeding the cap is reported as `DecodeError::OutOfMemory`.
    pub fn with_max_alloc(mut self, bytes: u64) -> Self {
        self.limits.max_alloc = Some(bytes);
        self
    }
}

impl Default for ImageFileDecoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ImageDecoder for ImageFileDecoder {
    fn id(&self) -> &'static str {
        "image"
    }

    fn decode(&self, path: &Path) -> Result<Bitmap, DecodeError> {
        let reader = ImageReader::open(path).map_err(|e| io_error(path, e))?;
        let mut reader = reader
            .with_guessed_format()
            .map_err(|e| io_error(path, e))?;
        reader.limits(self.limits.clone());

        let image = reader.decode().map_err(|e| match e {
            ImageError::Limits(_) => DecodeError::OutOfMemory(path.to_path_buf()),
            ImageError::IoError(io) => io_error(path, io),
            other => DecodeError::Malformed {
                path: path.to_path_buf(),
                message: other.to_string(),
            },
        })?;

        let mut rgba = image.into_rgba8();
        if self.flip_vertical {
            image::imageops::flip_vertical_in_place(&mut rgba);
        }

        let (width, height) = rgba.dimensions();
        log::trace!("Decoded {:?}: {}x{}", path, width, height);

        Ok(Bitmap::new(width, height, rgba.into_raw()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DecodeError {
    if source.kind() == ErrorKind::NotFound {
        DecodeError::NotFound(path.to_path_buf())
    } else {
        DecodeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
