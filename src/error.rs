use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to set up shared state: {0}")]
    Resource(String),

    #[error("Failed to read rubric {}: {source}", path.display())]
    RubricLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist rubric {}: {source}", path.display())]
    RubricSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open exam {}: {source}", path.display())]
    ExamLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarkerError {
    /// Errors raised before any worker is spawned. These abort the run.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            MarkerError::Config(_) | MarkerError::Resource(_) | MarkerError::RubricLoad { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MarkerError>;
