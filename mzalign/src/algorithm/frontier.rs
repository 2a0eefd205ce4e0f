use std::cmp::Ordering;
use std::collections::BinaryHeap;
use ordered_float::OrderedFloat;

use crate::data::peak::Peak;
use crate::data::spectrum::SpectrumCollection;
use crate::error::{AlignmentError, Result};

/// Heap slot for the next unconsumed peak of one spectrum.
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    peak: Peak,
}

impl FrontierEntry {
    fn key(&self) -> (OrderedFloat<f64>, usize) {
        (OrderedFloat(self.peak.mz), self.peak.spectrum_index)
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    // BinaryHeap is a max-heap; reverse so the smallest m/z (then spectrum index) is on top
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Multi-way merge over the spectra of a `SpectrumCollection`.
///
/// # Description
///
/// The frontier holds exactly one entry for every spectrum that still has
/// unconsumed peaks, ordered by m/z with ties broken by spectrum index.
/// Consuming the minimum feeds the next peak of the same spectrum back in, so
/// every spectrum is read strictly in position order. An exhausted spectrum
/// leaves the frontier for good.
///
#[derive(Debug)]
pub struct MergeFrontier<'a> {
    spectra: &'a SpectrumCollection,
    heap: BinaryHeap<FrontierEntry>,
}

impl<'a> MergeFrontier<'a> {
    /// Seeds the frontier with the first peak of every spectrum.
    ///
    /// # Errors
    ///
    /// `EmptySpectrum` if a spectrum has no peaks.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mzalign::algorithm::frontier::MergeFrontier;
    /// # use mzalign::data::spectrum::SpectrumCollection;
    /// let spectra = SpectrumCollection::new(vec![vec![1.0, 2.0, 3.0], vec![1.0, 3.0, 4.0], vec![2.0, 3.0]]).unwrap();
    /// let mut frontier = MergeFrontier::new(&spectra).unwrap();
    /// let first = frontier.pop_and_advance().unwrap();
    /// assert_eq!((first.spectrum_index, first.position, first.mz), (0, 0, 1.0));
    /// assert_eq!(frontier.peek_min().unwrap().spectrum_index, 1);
    /// ```
    pub fn new(spectra: &'a SpectrumCollection) -> Result<Self> {
        let mut heap = BinaryHeap::with_capacity(spectra.num_spectra());

        for (index, spectrum) in spectra.iter().enumerate() {
            let mz = spectrum.get(0).ok_or(AlignmentError::EmptySpectrum { index })?;
            heap.push(FrontierEntry {
                peak: Peak::new(index, 0, mz),
            });
        }

        Ok(MergeFrontier { spectra, heap })
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of spectra that still have unconsumed peaks.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the smallest unconsumed peak without removing it.
    pub fn peek_min(&self) -> Result<Peak> {
        self.heap
            .peek()
            .map(|entry| entry.peak)
            .ok_or(AlignmentError::EmptyFrontier)
    }

    /// Removes and returns the smallest unconsumed peak, feeding the next peak
    /// of the same spectrum into the frontier if there is one.
    pub fn pop_and_advance(&mut self) -> Result<Peak> {
        let entry = self.heap.pop().ok_or(AlignmentError::EmptyFrontier)?;
        let peak = entry.peak;
        let next_position = peak.position + 1;

        let next_mz = self
            .spectra
            .spectrum(peak.spectrum_index)
            .and_then(|spectrum| spectrum.get(next_position));

        if let Some(mz) = next_mz {
            self.heap.push(FrontierEntry {
                peak: Peak::new(peak.spectrum_index, next_position, mz),
            });
        }

        Ok(peak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_spectra() -> SpectrumCollection {
        SpectrumCollection::new(vec![vec![1.0, 2.0, 3.0], vec![1.0, 3.0, 4.0], vec![2.0, 3.0]]).unwrap()
    }

    #[test]
    fn test_initial_top() {
        let spectra = toy_spectra();
        let frontier = MergeFrontier::new(&spectra).unwrap();

        let top = frontier.peek_min().unwrap();
        assert_eq!(top.spectrum_index, 0);
        assert_eq!(top.position, 0);
        assert_eq!(top.mz, 1.0);
        assert_eq!(frontier.len(), 3);
    }

    #[test]
    fn test_full_merge_order() {
        let spectra = toy_spectra();
        let mut frontier = MergeFrontier::new(&spectra).unwrap();

        let mut merged = Vec::new();
        while !frontier.is_empty() {
            let peak = frontier.pop_and_advance().unwrap();
            merged.push((peak.mz, peak.spectrum_index, peak.position));
        }

        assert_eq!(
            merged,
            vec![
                (1.0, 0, 0),
                (1.0, 1, 0),
                (2.0, 0, 1),
                (2.0, 2, 0),
                (3.0, 0, 2),
                (3.0, 1, 1),
                (3.0, 2, 1),
                (4.0, 1, 2),
            ]
        );
    }

    #[test]
    fn test_spectrum_retires_when_exhausted() {
        let spectra = SpectrumCollection::new(vec![vec![5.0], vec![1.0, 10.0]]).unwrap();
        let mut frontier = MergeFrontier::new(&spectra).unwrap();

        assert_eq!(frontier.pop_and_advance().unwrap().mz, 1.0);
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.pop_and_advance().unwrap().mz, 5.0);
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.pop_and_advance().unwrap().mz, 10.0);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_empty_frontier_errors() {
        let spectra = SpectrumCollection::new(Vec::new()).unwrap();
        let mut frontier = MergeFrontier::new(&spectra).unwrap();

        assert!(frontier.is_empty());
        assert!(matches!(frontier.peek_min(), Err(AlignmentError::EmptyFrontier)));
        assert!(matches!(frontier.pop_and_advance(), Err(AlignmentError::EmptyFrontier)));
    }

    #[test]
    fn test_positions_are_consumed_in_order() {
        let spectra = SpectrumCollection::new(vec![
            vec![0.5, 1.5, 2.5, 3.5],
            vec![1.0, 1.1, 1.2],
            vec![0.1, 4.0],
        ])
        .unwrap();
        let mut frontier = MergeFrontier::new(&spectra).unwrap();

        let mut next_position = vec![0usize; spectra.num_spectra()];
        let mut last_mz = f64::NEG_INFINITY;
        while let Ok(peak) = frontier.pop_and_advance() {
            assert_eq!(peak.position, next_position[peak.spectrum_index]);
            assert!(peak.mz >= last_mz);
            next_position[peak.spectrum_index] += 1;
            last_mz = peak.mz;
        }

        for (index, spectrum) in spectra.iter().enumerate() {
            assert_eq!(next_position[index], spectrum.len());
        }
    }
}
