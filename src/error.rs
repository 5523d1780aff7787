use std::path::PathBuf;

use thiserror::Error;

/// Failures outside the scoring engine itself. The engine never fails.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Keystroke log at {0} has an empty target text")]
    EmptyText(PathBuf),
    #[error("Sample interval must be greater than zero")]
    ZeroSampleInterval,
}

pub type Result<T> = std::result::Result<T, ScoreError>;
