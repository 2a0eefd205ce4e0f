use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::error::{AlignmentError, Result};

/// The ascending m/z values of one spectrum.
///
/// Uses Arc<Vec<f64>> for efficient cloning - clone is O(1) instead of O(n).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakList {
    pub mz: Arc<Vec<f64>>,
}

impl PeakList {
    /// Constructs a new `PeakList`.
    ///
    /// The values are expected in ascending order; they are kept as given.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mzalign::data::spectrum::PeakList;
    /// let peaks = PeakList::new(vec![100.0, 200.0]);
    /// assert_eq!(*peaks.mz, vec![100.0, 200.0]);
    /// assert_eq!(peaks.len(), 2);
    /// ```
    pub fn new(mz: Vec<f64>) -> Self {
        PeakList { mz: Arc::new(mz) }
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Returns the m/z value at `position`, or `None` past the last peak.
    pub fn get(&self, position: usize) -> Option<f64> {
        self.mz.get(position).copied()
    }

    pub fn is_sorted(&self) -> bool {
        self.mz.windows(2).all(|w| w[0] <= w[1])
    }

    /// Returns an ascending copy of the peak list.
    pub fn sorted(&self) -> Self {
        if self.is_sorted() {
            return self.clone();
        }
        let mut mz = (*self.mz).clone();
        mz.sort_by(|a, b| a.total_cmp(b));
        PeakList::new(mz)
    }
}

impl From<Vec<f64>> for PeakList {
    fn from(mz: Vec<f64>) -> Self {
        PeakList::new(mz)
    }
}

/// The ragged input of an alignment run, one `PeakList` per spectrum.
///
/// # Description
///
/// A `SpectrumCollection` guarantees that every spectrum holds at least one peak
/// and that every m/z value is finite. It does not sort: spectra must already be
/// in ascending order (see `is_sorted` and `sorted`).
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrumCollection {
    spectra: Vec<PeakList>,
}

impl SpectrumCollection {
    /// Constructs a validated `SpectrumCollection`.
    ///
    /// # Arguments
    ///
    /// * `spectra` - one vector of ascending m/z values per spectrum.
    ///
    /// # Errors
    ///
    /// `EmptySpectrum` if a spectrum has no peaks, `InvalidInput` if a value is
    /// NaN or infinite.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mzalign::data::spectrum::SpectrumCollection;
    /// let spectra = SpectrumCollection::new(vec![vec![1.0, 2.0], vec![1.5]]).unwrap();
    /// assert_eq!(spectra.num_spectra(), 2);
    /// assert_eq!(spectra.num_peaks(), 3);
    /// assert!(SpectrumCollection::new(vec![vec![1.0], vec![]]).is_err());
    /// ```
    pub fn new(spectra: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_peak_lists(spectra.into_iter().map(PeakList::new).collect())
    }

    pub fn from_peak_lists(spectra: Vec<PeakList>) -> Result<Self> {
        for (index, spectrum) in spectra.iter().enumerate() {
            if spectrum.is_empty() {
                return Err(AlignmentError::EmptySpectrum { index });
            }
            if let Some(position) = spectrum.mz.iter().position(|mz| !mz.is_finite()) {
                return Err(AlignmentError::invalid_input(format!(
                    "spectrum {} holds a non-finite m/z value at position {}",
                    index, position
                )));
            }
        }
        Ok(SpectrumCollection { spectra })
    }

    pub fn num_spectra(&self) -> usize {
        self.spectra.len()
    }

    pub fn num_peaks(&self) -> usize {
        self.spectra.iter().map(PeakList::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    pub fn spectrum(&self, index: usize) -> Option<&PeakList> {
        self.spectra.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeakList> {
        self.spectra.iter()
    }

    /// Returns `true` if every spectrum is in ascending m/z order.
    pub fn is_sorted(&self) -> bool {
        self.spectra.iter().all(PeakList::is_sorted)
    }

    /// Returns a copy with every spectrum sorted ascending.
    pub fn sorted(&self) -> Self {
        SpectrumCollection {
            spectra: self.spectra.iter().map(PeakList::sorted).collect(),
        }
    }
}

impl Display for SpectrumCollection {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "SpectrumCollection(spectra: {}, peaks: {})", self.num_spectra(), self.num_peaks())
    }
}
