//! Model file lookup, downloading and loading.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use ort::session::Session;

use crate::error::{Error, Result};

use super::{ModelHandle, ModelVariant};

/// Directory holding the model files, with an optional download source for
/// the ones that are missing.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
    base_url: Option<String>,
}

impl ModelStore {
    /// Open a model store, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new<P: Into<PathBuf>>(dir: P, base_url: Option<String>) -> Result<Self> {
        let dir = dir.into();

        fs::create_dir_all(&dir).map_err(|source| Error::ModelDir {
            path: dir.clone(),
            source,
        })?;

        Ok(Self { dir, base_url })
    }

    /// The platform-appropriate default model directory:
    /// - Windows: `%LOCALAPPDATA%\cartoonize\models`
    /// - Linux: `~/.cache/cartoonize/models`
    /// - macOS: `~/Library/Caches/cartoonize/models`
    #[must_use]
    pub fn default_dir() -> PathBuf {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("cartoonize").join("models")
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the file for `variant` is already on disk.
    #[must_use]
    pub fn is_cached(&self, variant: ModelVariant) -> bool {
        self.dir.join(variant.filename()).is_file()
    }

    /// Get the path to a model file, downloading if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] if the file is missing and no download
    /// source is configured, or a download error.
    pub fn model_path(&self, variant: ModelVariant) -> Result<PathBuf> {
        let path = self.dir.join(variant.filename());

        if path.is_file() {
            return Ok(path);
        }

        let Some(base_url) = &self.base_url else {
            return Err(Error::ModelNotFound { path });
        };

        let url = format!("{}/{}", base_url.trim_end_matches('/'), variant.filename());
        download_file(&url, &path, variant.filename())?;

        Ok(path)
    }

    /// Load a fresh session for `variant`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be found or loaded.
    pub fn open(&self, variant: ModelVariant) -> Result<ModelHandle> {
        let path = self.model_path(variant)?;

        tracing::debug!("Loading {variant} model from {}", path.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: variant.filename().to_string(),
                source,
            })?
            .commit_from_file(&path)
            .map_err(|source| Error::ModelLoad {
                name: variant.filename().to_string(),
                source,
            })?;

        Ok(ModelHandle::new(variant, session))
    }
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path, name: &str) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| Error::ModelDownload {
            name: name.to_string(),
            source,
        })?;

    let pb = response
        .content_length()
        .map_or_else(ProgressBar::new_spinner, ProgressBar::new);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {name}"));

    // Write to a temporary file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;

    let mut downloaded = 0u64;
    let mut reader = response;

    loop {
        let mut buffer = [0u8; 8192];
        let bytes_read = std::io::Read::read(&mut reader, &mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;
    drop(file);

    pb.finish_with_message(format!("Downloaded {name}"));

    fs::rename(&temp_path, path)?;

    Ok(())
}
