use std::path::PathBuf;
use thiserror::Error;
use mzalign::AlignmentError;

/// Errors raised while reading peak lists or writing results.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A token on a peak list line is not a number (lines are 1-based)
    #[error("line {line}: cannot parse '{token}' as an m/z value")]
    ParseFloat { line: usize, token: String },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),
}
