//! Built-in image decoders.

mod image_decoder;

pub use image_decoder::ImageFileDecoder;
