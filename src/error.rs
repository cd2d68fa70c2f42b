use std::path::PathBuf;

use thiserror::Error;

use crate::images::CropRect;

/// Errors from discovering, decoding or cropping images.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("image directory not found: {}", .0.display())]
    MissingDir(PathBuf),

    #[error("no .jpg or .png images in {}", .0.display())]
    NoImages(PathBuf),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("crop rectangle {rect} does not fit a {width}x{height} image")]
    CropOutOfBounds {
        rect: CropRect,
        width: u32,
        height: u32,
    },
}

/// Errors from reading or writing the label table.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("label table is missing the '{0}' column")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid group id '{value}'")]
    InvalidGroupId { row: usize, value: String },

    #[error("failed to replace label table: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("label set is empty")]
    EmptyLabelSet,

    #[error("label '{0}' appears more than once")]
    DuplicateLabel(String),

    #[error("no images to review")]
    EmptyImageSet,
}
