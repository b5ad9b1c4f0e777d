//! The select / convert / save state machine.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::image::{self, Displayable, ImageSource, Pick};
use crate::model::{Inference, ModelStore, ModelVariant, OnnxInvoker};
use crate::notify::{Notice, Notifier};
use crate::preview::{NullSink, PngSink, Preview, PreviewSink};
use crate::storage::{CommandMediaIndex, ImageWriter, LogMediaIndex, MediaIndex};

use super::{Config, PipelineState};

/// A user action.
pub enum Action<'a> {
    /// Pick a new image from `source`.
    Select(&'a mut dyn ImageSource),
    /// Cartoonize the displayed image.
    Convert,
    /// Save the displayed image.
    Save,
}

/// Drives the pipeline in response to user actions.
///
/// The displayed image is the only input to convert and save. Actions run to
/// completion one at a time on the caller's thread.
pub struct Controller {
    variant: ModelVariant,
    model_input_size: u32,
    inference: Box<dyn Inference>,
    preview: Preview,
    writer: ImageWriter,
    state: PipelineState,
    displayed: Option<Displayable>,
}

impl Controller {
    /// Build a controller backed by ONNX models, as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model directory
    /// cannot be created.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let store = ModelStore::new(&config.models_dir, config.model_base_url.clone())?;

        let sink: Box<dyn PreviewSink> = match &config.preview_path {
            Some(path) => Box::new(PngSink::new(path)),
            None => Box::new(NullSink),
        };

        let media: Box<dyn MediaIndex> = match config
            .media_scan_command
            .as_deref()
            .and_then(CommandMediaIndex::parse)
        {
            Some(command) => Box::new(command),
            None => Box::new(LogMediaIndex),
        };

        let writer = ImageWriter::new(
            config.pictures_dir.clone(),
            config.directory_name.clone(),
            config.jpeg_quality,
            media,
        );

        Ok(Self::with_parts(
            config.variant,
            config.model_input_size,
            Box::new(OnnxInvoker::new(store)),
            Preview::new(sink),
            writer,
        ))
    }

    /// Build a controller from already constructed collaborators.
    #[must_use]
    pub fn with_parts(
        variant: ModelVariant,
        model_input_size: u32,
        inference: Box<dyn Inference>,
        preview: Preview,
        writer: ImageWriter,
    ) -> Self {
        Self {
            variant,
            model_input_size,
            inference,
            preview,
            writer,
            state: PipelineState::Empty,
            displayed: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// The image currently on screen.
    #[must_use]
    pub const fn displayed(&self) -> Option<&Displayable> {
        self.displayed.as_ref()
    }

    #[must_use]
    pub const fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn preview_mut(&mut self) -> &mut Preview {
        &mut self.preview
    }

    /// Ask `source` for an image and display it.
    ///
    /// Cancelling leaves everything as it was.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailure`] if the picked image cannot be decoded.
    pub fn select(&mut self, source: &mut dyn ImageSource) -> Result<PipelineState> {
        match source.pick()? {
            Pick::Selected(picked) => {
                self.display(picked);
                self.state = PipelineState::SourceLoaded;
            }
            Pick::Cancelled => tracing::debug!("Selection cancelled"),
        }

        Ok(self.state)
    }

    /// Cartoonize the displayed image and display the result.
    ///
    /// Converting an already cartoonized image runs the model over it again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageSelected`] if nothing is displayed, or an
    /// inference error. The state is unchanged on error.
    pub fn convert(&mut self) -> Result<()> {
        let displayed = self.displayed.as_ref().ok_or(Error::NoImageSelected)?;

        let tensor = image::to_tensor(displayed, self.model_input_size);
        let output = self.inference.infer(self.variant, &tensor)?;
        let cartoon = image::to_pixels(&output)?;

        self.display(Displayable::Bitmap(cartoon));
        self.state = PipelineState::Cartoonized;

        tracing::info!("Cartoonized with {} model", self.variant);
        Ok(())
    }

    /// Save the displayed image. The state does not change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoImageSelected`], [`Error::StorageUnavailable`] or
    /// [`Error::SaveFailed`].
    pub fn save(&mut self) -> Result<PathBuf> {
        let displayed = self.displayed.as_ref().ok_or(Error::NoImageSelected)?;
        self.writer.save(&displayed.to_pixels())
    }

    /// Run one action, report its outcome to `notifier` and let the preview
    /// catch up. Errors end here.
    pub fn handle(&mut self, action: Action<'_>, notifier: &mut dyn Notifier) -> Option<Notice> {
        let result = match action {
            Action::Select(source) => self.select(source).map(|_| None),
            Action::Convert => self.convert().map(|()| None),
            Action::Save => self.save().map(|path| Some(Notice::Saved(path))),
        };

        let notice = result.unwrap_or_else(|err| {
            tracing::warn!("{err}");
            Some(err.notice())
        });

        if let Some(notice) = &notice {
            notifier.notify(notice);
        }

        for completion in self.preview.pump() {
            tracing::debug!("Preview {:?}: {:?}", completion.ticket, completion.status);
        }

        notice
    }

    fn display(&mut self, image: Displayable) {
        self.preview.show(image.to_pixels().into_owned());
        self.displayed = Some(image);
    }
}
