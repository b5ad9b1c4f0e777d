//! Pipeline configuration.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::image::MODEL_IMAGE_SIZE;
use crate::model::{ModelStore, ModelVariant};
use crate::storage::DEFAULT_DIRECTORY_NAME;

/// Configuration for the cartoonization pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the model files.
    pub models_dir: PathBuf,

    /// Base URL missing model files are downloaded from. None disables downloads.
    pub model_base_url: Option<String>,

    /// Model used by the convert action.
    pub variant: ModelVariant,

    /// Side length of the square model input.
    pub model_input_size: u32,

    /// Output JPEG quality (1-100).
    pub jpeg_quality: u8,

    /// Public pictures directory. None means no storage is available.
    pub pictures_dir: Option<PathBuf>,

    /// Subdirectory of `pictures_dir` that receives saved images.
    pub directory_name: String,

    /// Command run with each saved file to register it with a media index.
    pub media_scan_command: Option<String>,

    /// File the preview is written to, if any.
    pub preview_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models_dir: ModelStore::default_dir(),
            model_base_url: None,
            variant: ModelVariant::Int8,
            model_input_size: MODEL_IMAGE_SIZE,
            jpeg_quality: 100,
            pictures_dir: dirs::picture_dir(),
            directory_name: DEFAULT_DIRECTORY_NAME.to_string(),
            media_scan_command: None,
            preview_path: None,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.model_input_size == 0 || self.model_input_size % 8 != 0 {
            return Err(Error::InvalidParameter {
                name: "model_input_size".to_string(),
                reason: "must be a positive multiple of 8".to_string(),
            });
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidParameter {
                name: "jpeg_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        let mut components = Path::new(&self.directory_name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal {
            return Err(Error::InvalidParameter {
                name: "directory_name".to_string(),
                reason: "must be a single directory name".to_string(),
            });
        }

        Ok(())
    }
}
