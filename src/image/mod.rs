//! Pixel buffers, tensor images and the conversions between them.

mod encode;
mod source;
mod tensor;

pub use encode::encode_jpeg;
pub use source::{decode_bytes, decode_file, ImageSource, PathSource, Pick, PromptSource};
pub use tensor::{to_pixels, to_tensor, Displayable};

use image::RgbaImage;
use ndarray::Array4;

/// Input resolution of the bundled cartoonization models.
pub const MODEL_IMAGE_SIZE: u32 = 512;

/// Number of color channels fed to the model.
pub const RGB_CHANNELS: usize = 3;

/// Decoded RGBA8 raster. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer(RgbaImage);

impl PixelBuffer {
    #[must_use]
    pub const fn new(image: RgbaImage) -> Self {
        Self(image)
    }

    /// A fully transparent buffer.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self(RgbaImage::new(width, height))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    #[must_use]
    pub const fn as_image(&self) -> &RgbaImage {
        &self.0
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.0
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self(image)
    }
}

/// Pixel data laid out the way the model expects it.
///
/// The array is NHWC `(1, height, width, 3)` with values in [-1, 1].
/// `source_dims` remembers the size of the buffer it was built from so the
/// model output can be mapped back onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorImage {
    data: Array4<f32>,
    source_dims: (u32, u32),
}

impl TensorImage {
    #[must_use]
    pub const fn new(data: Array4<f32>, source_dims: (u32, u32)) -> Self {
        Self { data, source_dims }
    }

    #[must_use]
    pub const fn data(&self) -> &Array4<f32> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Array4<f32> {
        self.data
    }

    #[must_use]
    pub const fn source_dims(&self) -> (u32, u32) {
        self.source_dims
    }
}
