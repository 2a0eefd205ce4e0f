use std::collections::VecDeque;
use std::fmt;
use std::fmt::{Display, Formatter};
use itertools::Itertools;

use crate::algorithm::frontier::MergeFrontier;
use crate::config::AlignmentConfig;
use crate::data::peak::Peak;
use crate::error::{AlignmentError, Result};

/// The candidate cluster under construction during a scan.
///
/// # Description
///
/// An `ActiveWindow` holds at most one peak per spectrum, in ascending m/z
/// order (which is also insertion order, since peaks always come from the
/// frontier minimum). It keeps a running average of its members and the m/z of
/// the most recently evicted peak, which together decide whether the window is
/// a settled alignment cluster. The window changes only through `try_insert`
/// and `evict_oldest`.
///
#[derive(Clone, Debug)]
pub struct ActiveWindow {
    members: VecDeque<Peak>,
    present: Vec<bool>,
    window_size: f64,
    require_all_spectra: bool,
    average_mz: f64,
    lower_bound: f64,
}

impl ActiveWindow {
    /// Creates an empty window for `num_spectra` spectra.
    ///
    /// # Arguments
    ///
    /// * `num_spectra` - number of input spectra; spectrum indices lie in `[0, num_spectra)`.
    /// * `window_size` - relative tolerance around the window average.
    ///
    pub fn new(num_spectra: usize, window_size: f64) -> Self {
        ActiveWindow {
            members: VecDeque::with_capacity(num_spectra),
            present: vec![false; num_spectra],
            window_size,
            require_all_spectra: false,
            average_mz: 0.0,
            lower_bound: f64::NEG_INFINITY,
        }
    }

    pub fn from_config(num_spectra: usize, config: &AlignmentConfig) -> Self {
        ActiveWindow::new(num_spectra, config.window_size)
            .with_require_all_spectra(config.require_all_spectra)
    }

    /// Only report the window as valid when it holds a peak from every spectrum.
    pub fn with_require_all_spectra(mut self, require_all_spectra: bool) -> Self {
        self.require_all_spectra = require_all_spectra;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Running mean of the members' m/z, 0 when the window is empty.
    pub fn average_mz(&self) -> f64 {
        self.average_mz
    }

    /// m/z of the last evicted peak, negative infinity before any eviction.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    pub fn members(&self) -> impl Iterator<Item = &Peak> {
        self.members.iter()
    }

    pub fn oldest(&self) -> Option<&Peak> {
        self.members.front()
    }

    pub fn newest(&self) -> Option<&Peak> {
        self.members.back()
    }

    pub fn contains_spectrum(&self, spectrum_index: usize) -> bool {
        self.present.get(spectrum_index).copied().unwrap_or(false)
    }

    fn upper_limit(&self, average_mz: f64) -> f64 {
        average_mz * (1.0 + self.window_size)
    }

    fn lower_limit(&self, average_mz: f64) -> f64 {
        average_mz * (1.0 - self.window_size)
    }

    /// Tries to admit the frontier's current minimum into the window.
    ///
    /// An empty window always takes the peak. Otherwise the peak is rejected if
    /// its spectrum is already represented, if it would sit above the upper
    /// tolerance of the new average, or if the oldest member would drop below
    /// the lower tolerance of the new average. On success exactly one peak is
    /// consumed from the frontier.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the peak was admitted, `Ok(false)` if it was rejected or the
    /// frontier is exhausted.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mzalign::algorithm::frontier::MergeFrontier;
    /// # use mzalign::algorithm::window::ActiveWindow;
    /// # use mzalign::data::spectrum::SpectrumCollection;
    /// let spectra = SpectrumCollection::new(vec![vec![100.0], vec![100.2], vec![150.0]]).unwrap();
    /// let mut frontier = MergeFrontier::new(&spectra).unwrap();
    /// let mut window = ActiveWindow::new(spectra.num_spectra(), 0.01);
    ///
    /// assert!(window.try_insert(&mut frontier).unwrap());
    /// assert!(window.try_insert(&mut frontier).unwrap());
    /// assert!(!window.try_insert(&mut frontier).unwrap());
    /// assert!((window.average_mz() - 100.1).abs() < 1e-9);
    /// ```
    pub fn try_insert(&mut self, frontier: &mut MergeFrontier) -> Result<bool> {
        if frontier.is_empty() {
            return Ok(false);
        }

        let candidate = frontier.peek_min()?;
        let spectrum_index = candidate.spectrum_index;
        if spectrum_index >= self.present.len() {
            return Err(AlignmentError::InconsistentWindow(format!(
                "spectrum index {} out of range for {} spectra",
                spectrum_index,
                self.present.len()
            )));
        }

        if self.members.is_empty() {
            if self.present[spectrum_index] {
                return Err(AlignmentError::InconsistentWindow(format!(
                    "spectrum {} marked present in an empty window",
                    spectrum_index
                )));
            }
            let peak = frontier.pop_and_advance()?;
            self.present[spectrum_index] = true;
            self.average_mz = peak.mz;
            self.members.push_back(peak);
            return Ok(true);
        }

        // a window holds at most one peak per spectrum
        if self.present[spectrum_index] {
            return Ok(false);
        }

        let old_size = self.members.len() as f64;
        let new_average = (old_size * self.average_mz + candidate.mz) / (old_size + 1.0);

        if candidate.mz > self.upper_limit(new_average) {
            return Ok(false);
        }
        if self
            .members
            .front()
            .is_some_and(|oldest| oldest.mz < self.lower_limit(new_average))
        {
            return Ok(false);
        }

        let peak = frontier.pop_and_advance()?;
        self.present[spectrum_index] = true;
        self.average_mz = new_average;
        self.members.push_back(peak);
        Ok(true)
    }

    /// Removes the oldest (lowest m/z) member and makes it the new lower bound.
    ///
    /// # Errors
    ///
    /// `EmptyWindow` if there is nothing to evict.
    pub fn evict_oldest(&mut self) -> Result<Peak> {
        let old_size = self.members.len();
        let evicted = self.members.pop_front().ok_or(AlignmentError::EmptyWindow)?;

        match self.present.get_mut(evicted.spectrum_index) {
            Some(flag) if *flag => *flag = false,
            _ => {
                return Err(AlignmentError::InconsistentWindow(format!(
                    "evicted peak {} was not marked present",
                    evicted
                )))
            }
        }

        self.lower_bound = evicted.mz;

        let new_size = self.members.len();
        self.average_mz = if new_size == 0 {
            0.0
        } else {
            (old_size as f64 * self.average_mz - evicted.mz) / new_size as f64
        };

        Ok(evicted)
    }

    /// Reports whether the window is a settled, complete alignment cluster.
    ///
    /// The window is invalid when it is empty, when the next frontier peak could
    /// still join it, when its newest or oldest member lies outside the tolerance
    /// of the average, or when the last evicted peak is not strictly below the
    /// lower tolerance. With `require_all_spectra` every spectrum must also be
    /// represented.
    pub fn is_valid(&self, frontier: &MergeFrontier) -> bool {
        if self.require_all_spectra && self.members.len() != self.present.len() {
            return false;
        }

        let (oldest, newest) = match (self.members.front(), self.members.back()) {
            (Some(oldest), Some(newest)) => (oldest, newest),
            _ => return false,
        };

        let upper = self.upper_limit(self.average_mz);
        let lower = self.lower_limit(self.average_mz);

        if let Ok(next) = frontier.peek_min() {
            if next.mz <= upper {
                return false;
            }
        }
        if newest.mz > upper {
            return false;
        }
        if oldest.mz < lower {
            return false;
        }
        if self.lower_bound >= lower {
            return false;
        }
        true
    }
}

/// Formats the window as its average followed by the member triples.
impl Display for ActiveWindow {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "ActiveWindow(average mz: {}, lower bound: {}, members: [{}])",
            self.average_mz,
            self.lower_bound,
            self.members.iter().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::spectrum::SpectrumCollection;

    fn spectra(values: Vec<Vec<f64>>) -> SpectrumCollection {
        SpectrumCollection::new(values).unwrap()
    }

    #[test]
    fn test_empty_window() {
        let data = spectra(vec![vec![1.0]]);
        let frontier = MergeFrontier::new(&data).unwrap();
        let window = ActiveWindow::new(1, 0.05);

        assert!(window.is_empty());
        assert_eq!(window.average_mz(), 0.0);
        assert_eq!(window.lower_bound(), f64::NEG_INFINITY);
        assert!(!window.is_valid(&frontier));
    }

    #[test]
    fn test_first_insert_always_succeeds() {
        let data = spectra(vec![vec![10.0], vec![500.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.0);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert_eq!(window.len(), 1);
        assert_eq!(window.average_mz(), 10.0);
        assert!(window.contains_spectrum(0));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_insert_on_exhausted_frontier() {
        let data = spectra(vec![vec![10.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(1, 0.05);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(frontier.is_empty());
        assert!(!window.try_insert(&mut frontier).unwrap());
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_rejects_second_peak_of_same_spectrum() {
        let data = spectra(vec![vec![100.0, 100.01], vec![200.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.05);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(!window.try_insert(&mut frontier).unwrap());

        // rejection leaves both structures untouched
        assert_eq!(window.len(), 1);
        assert_eq!(window.average_mz(), 100.0);
        assert_eq!(frontier.peek_min().unwrap().mz, 100.01);
    }

    #[test]
    fn test_rejects_peak_above_upper_tolerance() {
        let data = spectra(vec![vec![100.0], vec![103.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.01);

        assert!(window.try_insert(&mut frontier).unwrap());
        // new average 101.5, upper limit 102.515
        assert!(!window.try_insert(&mut frontier).unwrap());
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_rejects_when_oldest_falls_out() {
        // 100 and 101.9 fit a 0.01 window together, adding 102 would pull the
        // average to 101.3 and leave 100 below 100.287
        let data = spectra(vec![vec![100.0], vec![101.9], vec![102.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(3, 0.01);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(!window.try_insert(&mut frontier).unwrap());
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_evict_oldest_updates_average_and_lower_bound() {
        let data = spectra(vec![vec![100.0], vec![100.2], vec![100.4]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(3, 0.01);

        for _ in 0..3 {
            assert!(window.try_insert(&mut frontier).unwrap());
        }
        assert!((window.average_mz() - 100.2).abs() < 1e-9);

        let evicted = window.evict_oldest().unwrap();
        assert_eq!(evicted.mz, 100.0);
        assert_eq!(window.lower_bound(), 100.0);
        assert!(!window.contains_spectrum(0));
        assert!((window.average_mz() - 100.3).abs() < 1e-9);

        window.evict_oldest().unwrap();
        window.evict_oldest().unwrap();
        assert!(window.is_empty());
        assert_eq!(window.average_mz(), 0.0);
        assert_eq!(window.lower_bound(), 100.4);
    }

    #[test]
    fn test_evict_from_empty_window_errors() {
        let mut window = ActiveWindow::new(2, 0.01);
        assert!(matches!(window.evict_oldest(), Err(AlignmentError::EmptyWindow)));
    }

    #[test]
    fn test_invalid_while_frontier_can_extend() {
        let data = spectra(vec![vec![100.0], vec![100.5]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.01);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(!window.is_valid(&frontier));

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(frontier.is_empty());
        assert!(window.is_valid(&frontier));
    }

    #[test]
    fn test_valid_when_frontier_is_far() {
        let data = spectra(vec![vec![100.0], vec![200.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.01);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(window.is_valid(&frontier));
    }

    #[test]
    fn test_invalid_when_last_eviction_is_within_tolerance() {
        let data = spectra(vec![vec![100.0, 100.3], vec![100.2]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.01);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(window.try_insert(&mut frontier).unwrap());
        // 100.3 comes from spectrum 0, which is already present
        assert!(!window.try_insert(&mut frontier).unwrap());
        window.evict_oldest().unwrap();
        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(frontier.is_empty());

        // average 100.25, lower limit 99.2475; evicted 100.0 still inside
        assert!(!window.is_valid(&frontier));
    }

    #[test]
    fn test_require_all_spectra() {
        let data = spectra(vec![vec![100.0], vec![300.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(2, 0.01).with_require_all_spectra(true);

        assert!(window.try_insert(&mut frontier).unwrap());
        assert!(!window.is_valid(&frontier));

        let mut relaxed = ActiveWindow::new(2, 0.01);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        assert!(relaxed.try_insert(&mut frontier).unwrap());
        assert!(relaxed.is_valid(&frontier));
    }

    #[test]
    fn test_members_stay_sorted_and_unique() {
        let data = spectra(vec![
            vec![50.0, 50.02, 50.05],
            vec![50.01, 50.03],
            vec![49.99, 50.04, 50.06],
        ]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(3, 0.001);

        while !frontier.is_empty() {
            if !window.try_insert(&mut frontier).unwrap() {
                window.evict_oldest().unwrap();
            }
            let members: Vec<Peak> = window.members().copied().collect();
            assert!(members.windows(2).all(|w| w[0].mz <= w[1].mz));
            let mut indices: Vec<usize> = members.iter().map(|p| p.spectrum_index).collect();
            indices.sort_unstable();
            indices.dedup();
            assert_eq!(indices.len(), members.len());
            for index in 0..3 {
                assert_eq!(window.contains_spectrum(index), indices.contains(&index));
            }
        }
    }

    #[test]
    fn test_display() {
        let data = spectra(vec![vec![7.0]]);
        let mut frontier = MergeFrontier::new(&data).unwrap();
        let mut window = ActiveWindow::new(1, 0.05);
        window.try_insert(&mut frontier).unwrap();

        assert_eq!(
            window.to_string(),
            "ActiveWindow(average mz: 7, lower bound: -inf, members: [(0, 0, 7)])"
        );
    }
}
