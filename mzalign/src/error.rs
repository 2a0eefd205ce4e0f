//! Error types for alignment point detection.

use thiserror::Error;

/// Errors raised while validating input or scanning spectra.
///
/// `EmptySpectrum` and `InvalidInput` describe bad data and are reported before
/// any scan begins. `EmptyFrontier`, `EmptyWindow` and `InconsistentWindow` are
/// precondition failures of the scan structures; once they escape the scan they
/// are wrapped into a `ContractViolation` carrying the state of the run.
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// An input spectrum holds no peaks
    #[error("invalid input: spectrum {index} is empty")]
    EmptySpectrum { index: usize },

    /// Any other rejected input (window size, non-finite m/z, thread count)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The merge frontier has no unconsumed peaks left
    #[error("merge frontier is empty")]
    EmptyFrontier,

    /// The active window has no members to evict
    #[error("active window is empty")]
    EmptyWindow,

    /// The window's spectrum membership disagrees with its members
    #[error("inconsistent active window: {0}")]
    InconsistentWindow(String),

    /// A scan invariant was broken; the run is aborted
    #[error("contract violation in {context} (frontier holds {frontier_size} peaks): {window}")]
    ContractViolation {
        context: String,
        frontier_size: usize,
        window: String,
    },

    /// The worker pool for batch runs could not be created
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl AlignmentError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AlignmentError::InvalidInput(message.into())
    }

    /// Returns `true` for errors caused by the caller's data rather than the scan.
    pub fn is_input_error(&self) -> bool {
        matches!(self, AlignmentError::EmptySpectrum { .. } | AlignmentError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, AlignmentError>;
