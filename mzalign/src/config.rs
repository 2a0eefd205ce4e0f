use serde::{Deserialize, Serialize};

use crate::error::{AlignmentError, Result};

/// Configuration for alignment point detection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Relative tolerance around a cluster average (default: 1e-5, i.e. 10 ppm)
    pub window_size: f64,
    /// Only accept clusters holding one peak from every spectrum (default: false)
    pub require_all_spectra: bool,
    /// Worker threads used for batch runs (default: 4)
    pub num_threads: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        AlignmentConfig {
            window_size: 1e-5,
            require_all_spectra: false,
            num_threads: 4,
        }
    }
}

impl AlignmentConfig {
    pub fn new(window_size: f64) -> Self {
        AlignmentConfig {
            window_size,
            ..Default::default()
        }
    }

    pub fn with_window_size(mut self, window_size: f64) -> Self {
        self.window_size = window_size;
        self
    }

    /// Switches to virtual lock mass mode, where a cluster must span every spectrum.
    pub fn with_require_all_spectra(mut self, require_all_spectra: bool) -> Self {
        self.require_all_spectra = require_all_spectra;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Checks that the window size is usable as a relative tolerance.
    ///
    /// The window size must be finite and non-negative. The thread count is
    /// only checked where a thread pool is built.
    pub fn validate(&self) -> Result<()> {
        if !self.window_size.is_finite() {
            return Err(AlignmentError::invalid_input(format!(
                "window size must be finite, got {}",
                self.window_size
            )));
        }
        if self.window_size < 0.0 {
            return Err(AlignmentError::invalid_input(format!(
                "window size must not be negative, got {}",
                self.window_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlignmentConfig::default();
        assert!(config.window_size == 1e-5);
        assert!(!config.require_all_spectra);
        assert!(config.num_threads == 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AlignmentConfig::new(0.05)
            .with_require_all_spectra(true)
            .with_num_threads(2);
        assert!(config.window_size == 0.05);
        assert!(config.require_all_spectra);
        assert!(config.num_threads == 2);
    }

    #[test]
    fn test_zero_window_is_valid() {
        assert!(AlignmentConfig::new(0.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_window_sizes() {
        for w in [-0.1, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = AlignmentConfig::new(w).validate().unwrap_err();
            assert!(err.is_input_error(), "window size {} should be rejected", w);
        }
    }

    #[test]
    fn test_wide_window_is_valid() {
        assert!(AlignmentConfig::new(1.0).validate().is_ok());
        assert!(AlignmentConfig::new(1.5).validate().is_ok());
    }

    #[test]
    fn test_zero_threads_left_to_batch_runs() {
        assert!(AlignmentConfig::new(0.01).with_num_threads(0).validate().is_ok());
    }
}
