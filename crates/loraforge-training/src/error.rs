use std::path::PathBuf;
use thiserror::Error;

pub type LaunchResult<T> = std::result::Result<T, LaunchError>;

/// Unified error boundary for the launcher.
///
/// Every fallible external call (dataset check/load, model acquisition,
/// training, adapter save) maps into one of these variants; each variant
/// carries a distinct process exit code.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid launch config: {0}")]
    InvalidConfig(String),

    #[error("dataset file not found: {}", .0.display())]
    MissingDataset(PathBuf),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("model acquisition failed: {0}")]
    Acquisition(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaunchError {
    /// Exit status reported by the process for this failure class.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingDataset(_) | Self::Dataset(_) => 1,
            Self::Acquisition(_) => 2,
            Self::Training(_) => 3,
            Self::Artifact(_) => 4,
            Self::InvalidConfig(_) => 64,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => 70,
        }
    }
}
