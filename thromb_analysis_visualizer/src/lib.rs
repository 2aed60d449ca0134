//! Rendering and file output for `thromb_analysis` reports.
//!
//! The analysis crate never touches image formats. This crate decodes the
//! input scan, colors label maps, and writes every artifact of a run.

use std::error::Error;
use std::path::{Path, PathBuf};
use thiserror::Error;
use thromb_analysis::AnalysisError;

pub mod artifacts;
pub mod color_table;
pub mod image_helper;
pub mod loader;
pub mod render;

pub use artifacts::{ArtifactWriter, ComponentMaskWriter};
pub use color_table::ColorTable;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image codec error on {path:?}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("TIFF encoding error on {path:?}")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Label {label} does not fit into a 32-bit raster")]
    LabelOverflow { label: usize },

    #[error("Image extent {extent} exceeds the 32-bit limit")]
    ExtentOverflow { extent: usize },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl RenderError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn image(path: &Path, source: image::ImageError) -> Self {
        Self::Image {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn tiff(path: &Path, source: tiff::TiffError) -> Self {
        Self::Tiff {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Formats an error with its whole `source()` chain on one line.
pub fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Converts a grid extent to the `u32` the image codecs expect.
pub(crate) fn extent(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| RenderError::ExtentOverflow { extent: value })
}
