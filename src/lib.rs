//! # cartoonize
//!
//! Pick a photo, run it through a pre-trained White-box CartoonGAN model,
//! preview the result and save it as a JPEG in the pictures directory.
//!
//! The model itself is an opaque ONNX file in one of three builds (fp32,
//! fp16, int8). This crate handles picking, tensor conversion, invoking the
//! model, previewing and persisting.
//!
//! ## Example
//!
//! ```no_run
//! use cartoonize::{Config, Controller, PathSource};
//!
//! # fn main() -> cartoonize::Result<()> {
//! let mut controller = Controller::new(Config::default())?;
//!
//! controller.select(&mut PathSource::new("photo.jpg"))?;
//! controller.convert()?;
//! let saved = controller.save()?;
//! println!("saved to {}", saved.display());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod preview;
pub mod storage;

pub use error::{Error, Result};
pub use crate::image::{Displayable, ImageSource, PathSource, Pick, PixelBuffer, TensorImage};
pub use model::{Inference, ModelVariant};
pub use pipeline::{Action, Config, Controller, PipelineState};
