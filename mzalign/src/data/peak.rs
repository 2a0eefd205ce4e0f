use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// A single m/z observation taken from one spectrum.
///
/// # Description
///
/// A `Peak` records which spectrum it came from, its position inside that
/// spectrum and its m/z value. Peaks are produced lazily by the merge frontier
/// and never change after creation.
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub spectrum_index: usize,
    pub position: usize,
    pub mz: f64,
}

impl Peak {
    /// Constructs a new `Peak`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mzalign::data::peak::Peak;
    /// let peak = Peak::new(1, 0, 500.25);
    /// assert_eq!(peak.spectrum_index, 1);
    /// assert_eq!(peak.position, 0);
    /// assert_eq!(peak.mz, 500.25);
    /// ```
    pub fn new(spectrum_index: usize, position: usize, mz: f64) -> Self {
        Peak {
            spectrum_index,
            position,
            mz,
        }
    }
}

/// Formats the `Peak` as a `(spectrum, position, mz)` triple.
impl Display for Peak {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.spectrum_index, self.position, self.mz)
    }
}
