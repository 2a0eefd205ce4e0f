// data module
pub mod data {
    pub mod peak;
    pub mod spectrum;
}

// algorithm module
pub mod algorithm {
    pub mod frontier;
    pub mod window;
    pub mod scan;
    pub mod overlap;
}

pub mod config;
pub mod error;

pub use algorithm::scan::{align, detect_alignment_points, detect_alignment_points_batch, AlignmentReport};
pub use config::AlignmentConfig;
pub use data::spectrum::SpectrumCollection;
pub use error::{AlignmentError, Result};
