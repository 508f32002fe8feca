use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the census pipeline.
///
/// Each stage reports its own class so that frontends can present them
/// distinctly instead of collapsing every fault into one crash.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("failed to load image {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read image directory {}: {source}", .path.display())]
    ImageDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image contains no pixels")]
    EmptyImage,

    #[error("the {channel} channel has zero variance; whitening is undefined for a constant channel")]
    DegenerateImage { channel: &'static str },

    #[error("cluster count {requested} is outside the supported range 2..=19")]
    InvalidClusterCount { requested: usize },

    #[error("color naming failed: {0}")]
    Naming(#[from] NamingError),
}

/// Failures from the external color-naming service.
#[derive(Debug, Error)]
pub enum NamingError {
    #[error("naming service unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("naming service answered with HTTP status {code}")]
    Status { code: u16 },

    #[error("naming service response did not match the expected shape: {0}")]
    Malformed(#[source] serde_json::Error),
}
