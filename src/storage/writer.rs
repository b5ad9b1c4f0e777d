//! Saving pixel buffers as JPEG files in the pictures directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::image::{encode_jpeg, PixelBuffer};

use super::MediaIndex;

/// Subdirectory of the pictures directory that receives saved images.
pub const DEFAULT_DIRECTORY_NAME: &str = "CartoonImages";

/// Name of the file saved at `millis` since the Unix epoch.
#[must_use]
pub fn file_name(millis: u128) -> String {
    format!("cartoon_{millis}.jpg")
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis())
}

/// Writes JPEG files to `<pictures>/<directory_name>/cartoon_<millis>.jpg`.
pub struct ImageWriter {
    pictures_dir: Option<PathBuf>,
    directory_name: String,
    quality: u8,
    media: Box<dyn MediaIndex>,
    clock: fn() -> u128,
}

impl ImageWriter {
    #[must_use]
    pub fn new(
        pictures_dir: Option<PathBuf>,
        directory_name: impl Into<String>,
        quality: u8,
        media: Box<dyn MediaIndex>,
    ) -> Self {
        Self {
            pictures_dir,
            directory_name: directory_name.into(),
            quality,
            media,
            clock: unix_millis,
        }
    }

    /// Take file timestamps from `clock` instead of the system time.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u128) -> Self {
        self.clock = clock;
        self
    }

    /// Directory files are written to, if a pictures directory is known.
    #[must_use]
    pub fn target_dir(&self) -> Option<PathBuf> {
        self.pictures_dir
            .as_ref()
            .map(|dir| dir.join(&self.directory_name))
    }

    /// Check that the pictures directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] otherwise.
    pub fn check_storage(&self) -> Result<&Path> {
        let Some(dir) = self.pictures_dir.as_deref() else {
            return Err(Error::StorageUnavailable {
                reason: "no pictures directory".to_string(),
            });
        };

        let metadata = fs::metadata(dir).map_err(|err| Error::StorageUnavailable {
            reason: format!("{}: {err}", dir.display()),
        })?;

        if !metadata.is_dir() {
            return Err(Error::StorageUnavailable {
                reason: format!("{} is not a directory", dir.display()),
            });
        }

        if metadata.permissions().readonly() {
            return Err(Error::StorageUnavailable {
                reason: format!("{} is read-only", dir.display()),
            });
        }

        Ok(dir)
    }

    /// Save `image` under a name derived from the writer's clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] or [`Error::SaveFailed`].
    pub fn save(&self, image: &PixelBuffer) -> Result<PathBuf> {
        self.save_at(image, (self.clock)())
    }

    /// Save `image` as `cartoon_<millis>.jpg`. An existing file with the same
    /// name is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] or [`Error::SaveFailed`].
    pub fn save_at(&self, image: &PixelBuffer, millis: u128) -> Result<PathBuf> {
        let dir = self.check_storage()?.join(&self.directory_name);

        fs::create_dir_all(&dir).map_err(|err| Error::SaveFailed {
            path: dir.clone(),
            reason: err.to_string(),
        })?;

        let path = dir.join(file_name(millis));

        if let Err(reason) = self.write_jpeg(image, &path) {
            if path.exists() {
                if let Err(err) = fs::remove_file(&path) {
                    tracing::warn!("Could not remove partial file {}: {err}", path.display());
                }
            }
            return Err(Error::SaveFailed { path, reason });
        }

        tracing::info!("Saved {}", path.display());

        if let Err(err) = self.media.register(&path) {
            tracing::warn!("Media index registration failed for {}: {err}", path.display());
        }

        Ok(path)
    }

    /// The file handle is closed when `out` drops, on every path.
    fn write_jpeg(&self, image: &PixelBuffer, path: &Path) -> std::result::Result<(), String> {
        let file = File::create(path).map_err(|err| err.to_string())?;
        let mut out = BufWriter::new(file);

        encode_jpeg(image, &mut out, self.quality).map_err(|err| err.to_string())?;
        out.flush().map_err(|err| err.to_string())?;

        Ok(())
    }
}
