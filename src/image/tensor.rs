//! Conversion between displayable images and model tensors.

use std::borrow::Cow;

use image::{imageops, imageops::FilterType, Rgba, RgbaImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{PixelBuffer, TensorImage, RGB_CHANNELS};

/// Whatever is currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Displayable {
    /// A decoded raster.
    Bitmap(PixelBuffer),
    /// Something with a size but no backing pixel data, such as a vector
    /// placeholder.
    Placeholder { width: u32, height: u32 },
}

impl Displayable {
    /// The pixels behind this image.
    ///
    /// Placeholders become a zero-filled buffer of their intrinsic size
    /// (at least 1x1) instead of failing.
    #[must_use]
    pub fn to_pixels(&self) -> Cow<'_, PixelBuffer> {
        match self {
            Self::Bitmap(pixels) => Cow::Borrowed(pixels),
            Self::Placeholder { width, height } => {
                Cow::Owned(PixelBuffer::blank((*width).max(1), (*height).max(1)))
            }
        }
    }
}

impl From<PixelBuffer> for Displayable {
    fn from(pixels: PixelBuffer) -> Self {
        Self::Bitmap(pixels)
    }
}

/// Build a model input tensor from a displayable image.
///
/// The image is:
/// 1. Resolved to pixels (placeholders fall back to a blank buffer)
/// 2. Resized to `size`x`size` using Lanczos3
/// 3. Stripped of alpha
/// 4. Normalized to [-1, 1]
/// 5. Returned as NHWC tensor (1, size, size, 3)
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_tensor(image: &Displayable, size: u32) -> TensorImage {
    let pixels = image.to_pixels();
    let source_dims = pixels.dimensions();

    let resized = imageops::resize(pixels.as_image(), size, size, FilterType::Lanczos3);
    let side = size as usize;

    let mut tensor = Array4::<f32>::zeros((1, side, side, RGB_CHANNELS));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..RGB_CHANNELS {
            tensor[[0, y as usize, x as usize, c]] = normalize(pixel[c]);
        }
    }

    tracing::debug!(
        "Built {side}x{side} tensor from {}x{} image",
        source_dims.0,
        source_dims.1
    );

    TensorImage::new(tensor, source_dims)
}

/// Turn a model output tensor back into an opaque pixel buffer at the
/// dimensions of the image the input tensor was built from.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the tensor is not `(1, h, w, 3)`.
#[allow(clippy::cast_possible_truncation)]
pub fn to_pixels(tensor: &TensorImage) -> Result<PixelBuffer> {
    let data = tensor.data();
    let (batch, height, width, channels) = data.dim();

    if batch != 1 || channels != RGB_CHANNELS || height == 0 || width == 0 {
        return Err(Error::ShapeMismatch {
            expected: "(1, h, w, 3)".to_string(),
            actual: format!("{:?}", data.shape()),
        });
    }

    // Safe: dimensions come from an image whose sides fit in u32
    let mut img = RgbaImage::new(width as u32, height as u32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let (xi, yi) = (x as usize, y as usize);
        *pixel = Rgba([
            denormalize(data[[0, yi, xi, 0]]),
            denormalize(data[[0, yi, xi, 1]]),
            denormalize(data[[0, yi, xi, 2]]),
            u8::MAX,
        ]);
    }

    let (src_w, src_h) = tensor.source_dims();
    if (src_w, src_h) != img.dimensions() && src_w > 0 && src_h > 0 {
        img = imageops::resize(&img, src_w, src_h, FilterType::Lanczos3);
    }

    Ok(PixelBuffer::new(img))
}

/// Normalize a channel value from [0, 255] to [-1, 1].
#[inline]
fn normalize(value: u8) -> f32 {
    (f32::from(value) / 127.5) - 1.0
}

/// Denormalize a value from [-1, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    let scaled = (value + 1.0) * 127.5;
    scaled.clamp(0.0, 255.0) as u8
}
