use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the program before the reveal starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to load image `{}`", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image `{}` has no pixels", path.display())]
    EmptyImage { path: PathBuf },

    #[error("image of {width}x{height} pixels is too large to index")]
    TooManyPixels { width: u32, height: u32 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
