//! Image decoding for card assets.
//!
//! This module provides:
//! - `Bitmap`: a decoded RGBA8 pixel buffer with its dimensions
//! - `ImageDecoder`: the seam between loader threads and the codec
//! - `ImageFileDecoder`: the built-in decoder backed by the `image` crate
//!
//! Decoders are shared between loader threads, so implementations must be
//! `Send + Sync` and must report every failure as a `DecodeError` value.

mod decoder;
pub mod decoders;

pub use decoder::{Bitmap, DecodeError, ImageDecoder};
pub use decoders::ImageFileDecoder;
