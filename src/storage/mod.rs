//! Persisting images to the pictures directory.

mod media;
mod writer;

pub use media::{CommandMediaIndex, LogMediaIndex, MediaIndex};
pub use writer::{file_name, ImageWriter, DEFAULT_DIRECTORY_NAME};
