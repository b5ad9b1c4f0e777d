//! Where selected images come from.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{Displayable, PixelBuffer};

/// Outcome of asking the user for an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Selected(Displayable),
    Cancelled,
}

/// A photo picker.
pub trait ImageSource {
    /// Ask for an image. Blocks until the user picks one or cancels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailure`] if the chosen resource is not a
    /// readable image.
    fn pick(&mut self) -> Result<Pick>;
}

/// Load and decode an image file into RGBA8.
///
/// # Errors
///
/// Returns [`Error::DecodeFailure`] if the file cannot be read or decoded.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::DecodeFailure {
        source_name: path.display().to_string(),
        source,
    })?;

    tracing::info!(
        "Decoded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );

    Ok(PixelBuffer::new(img.to_rgba8()))
}

/// Decode an in-memory encoded image into RGBA8.
///
/// # Errors
///
/// Returns [`Error::DecodeFailure`] if the bytes are not a supported image.
pub fn decode_bytes(bytes: &[u8], name: &str) -> Result<PixelBuffer> {
    let img = image::load_from_memory(bytes).map_err(|source| Error::DecodeFailure {
        source_name: name.to_string(),
        source,
    })?;

    Ok(PixelBuffer::new(img.to_rgba8()))
}

/// Picks a fixed file, or cancels when there is none.
#[derive(Debug, Clone, Default)]
pub struct PathSource {
    path: Option<PathBuf>,
}

impl PathSource {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A source that always cancels.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self { path: None }
    }
}

impl ImageSource for PathSource {
    fn pick(&mut self) -> Result<Pick> {
        match &self.path {
            Some(path) => Ok(Pick::Selected(decode_file(path)?.into())),
            None => Ok(Pick::Cancelled),
        }
    }
}

/// Prompts for a path on a line-oriented terminal. An empty answer or end of
/// input cancels.
pub struct PromptSource<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ImageSource for PromptSource<R, W> {
    fn pick(&mut self) -> Result<Pick> {
        write!(self.output, "Image path (empty to cancel): ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Pick::Cancelled);
        }

        let answer = line.trim();
        if answer.is_empty() {
            return Ok(Pick::Cancelled);
        }

        Ok(Pick::Selected(decode_file(answer)?.into()))
    }
}
