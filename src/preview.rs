//! Showing the current image.
//!
//! Show requests are queued and rendered later on the same thread by
//! [`Preview::pump`]. Only the newest request is rendered. A request replaced
//! before it was rendered is reported as superseded and its pixels are dropped
//! right away, so at most one image is ever waiting.

use std::path::PathBuf;

use image::ImageFormat;

use crate::error::{Error, Result};
use crate::image::PixelBuffer;

/// Where previews end up.
pub trait PreviewSink {
    /// Render `image`, replacing whatever was shown before.
    ///
    /// # Errors
    ///
    /// Returns an error if the image could not be rendered.
    fn render(&mut self, image: &PixelBuffer) -> Result<()>;
}

/// Discards every preview.
#[derive(Debug, Default)]
pub struct NullSink;

impl PreviewSink for NullSink {
    fn render(&mut self, _image: &PixelBuffer) -> Result<()> {
        Ok(())
    }
}

/// Writes each preview to a PNG file, overwriting the previous one.
#[derive(Debug, Clone)]
pub struct PngSink {
    path: PathBuf,
}

impl PngSink {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl PreviewSink for PngSink {
    fn render(&mut self, image: &PixelBuffer) -> Result<()> {
        image
            .as_image()
            .save_with_format(&self.path, ImageFormat::Png)
            .map_err(|err| Error::SaveFailed {
                path: self.path.clone(),
                reason: err.to_string(),
            })?;

        tracing::debug!("Preview written to {}", self.path.display());
        Ok(())
    }
}

/// Identifies one show request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// How a show request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Shown,
    Superseded,
    Failed,
}

/// Completion notification for one show request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub ticket: Ticket,
    pub status: Status,
}

/// Latest show request in front of a [`PreviewSink`].
pub struct Preview {
    sink: Box<dyn PreviewSink>,
    latest: Option<(Ticket, PixelBuffer)>,
    completed: Vec<Completion>,
    next_ticket: u64,
}

impl Preview {
    #[must_use]
    pub fn new(sink: Box<dyn PreviewSink>) -> Self {
        Self {
            sink,
            latest: None,
            completed: Vec::new(),
            next_ticket: 0,
        }
    }

    /// Queue `image` for display, superseding any request not yet rendered.
    pub fn show(&mut self, image: PixelBuffer) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        if let Some((replaced, _)) = self.latest.replace((ticket, image)) {
            self.completed.push(Completion {
                ticket: replaced,
                status: Status::Superseded,
            });
        }

        ticket
    }

    /// Number of images waiting to be rendered; never more than one.
    #[must_use]
    pub fn pending(&self) -> usize {
        usize::from(self.latest.is_some())
    }

    /// Render the newest request and report everything finished since the
    /// last pump, in ticket order.
    pub fn pump(&mut self) -> Vec<Completion> {
        let mut completions = std::mem::take(&mut self.completed);

        if let Some((ticket, image)) = self.latest.take() {
            let status = if let Err(err) = self.sink.render(&image) {
                tracing::warn!("Preview failed: {err}");
                Status::Failed
            } else {
                Status::Shown
            };

            completions.push(Completion { ticket, status });
        }

        completions
    }
}
