//! JPEG encoding.

use std::io::Write;

use image::buffer::ConvertBuffer;
use image::{codecs::jpeg::JpegEncoder, ImageResult, RgbImage};

use super::PixelBuffer;

/// Encode a pixel buffer as JPEG into `writer`.
///
/// JPEG has no alpha channel, so alpha is dropped.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn encode_jpeg<W: Write>(pixels: &PixelBuffer, writer: W, quality: u8) -> ImageResult<()> {
    let rgb: RgbImage = pixels.as_image().convert();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(writer, quality))
}
