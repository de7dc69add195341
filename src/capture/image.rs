//! Decoded image type for imported files

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::domain::ItemId;

/// Failure to turn one file into pixels
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("could not decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

impl ImportError {
    pub fn path(&self) -> &Path {
        match self {
            ImportError::Decode { path, .. } => path,
        }
    }
}

/// Outcome of a batch import; failures never abort the batch
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub imported: Vec<ItemId>,
    pub failures: Vec<ImportError>,
}

/// An imported image with its RGBA pixels and the file it came from
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub rgba: RgbaImage,
    pub path: PathBuf,
}

impl LoadedImage {
    /// Decode the file at `path` into RGBA8
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let decoded = image::open(path).map_err(|err| ImportError::Decode {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        log::debug!(
            "Decoded {:?}: {}x{} pixels",
            path,
            rgba.width(),
            rgba.height()
        );
        Ok(Self {
            rgba,
            path: path.to_path_buf(),
        })
    }

    /// Get the width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}
