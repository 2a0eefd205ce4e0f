use log::{debug, info, trace};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::algorithm::frontier::MergeFrontier;
use crate::algorithm::overlap::{overlap_mask, remove_overlaps};
use crate::algorithm::window::ActiveWindow;
use crate::config::AlignmentConfig;
use crate::data::peak::Peak;
use crate::data::spectrum::SpectrumCollection;
use crate::error::{AlignmentError, Result};

/// A tentative alignment point and the peaks whose average it is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentCluster {
    pub mz: f64,
    pub peaks: Vec<Peak>,
}

impl AlignmentCluster {
    fn from_window(window: &ActiveWindow) -> Self {
        AlignmentCluster {
            mz: window.average_mz(),
            peaks: window.members().copied().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn spectrum_indices(&self) -> Vec<usize> {
        self.peaks.iter().map(|peak| peak.spectrum_index).collect()
    }

    /// Returns `true` if every peak lies within `window_size` of the cluster m/z.
    pub fn is_within_tolerance(&self, window_size: f64) -> bool {
        let lower = self.mz * (1.0 - window_size);
        let upper = self.mz * (1.0 + window_size);
        self.peaks.iter().all(|peak| lower <= peak.mz && peak.mz <= upper)
    }
}

/// Outcome of one alignment run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub window_size: f64,
    pub require_all_spectra: bool,
    pub num_spectra: usize,
    pub num_peaks: usize,
    /// Clusters in the order the scan emitted them, overlaps included
    pub tentative: Vec<AlignmentCluster>,
    /// Final, non-overlapping alignment points in ascending order
    pub alignment_points: Vec<f64>,
    pub overlaps_removed: usize,
}

impl AlignmentReport {
    pub fn tentative_points(&self) -> Vec<f64> {
        self.tentative.iter().map(|cluster| cluster.mz).collect()
    }

    /// The tentative clusters that survived overlap removal.
    pub fn alignment_clusters(&self) -> Vec<&AlignmentCluster> {
        let mask = overlap_mask(&self.tentative_points(), self.window_size);
        self.tentative
            .iter()
            .zip(mask)
            .filter(|(_, overlapping)| !overlapping)
            .map(|(cluster, _)| cluster)
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    Done,
}

/// Drives the merge frontier and the active window over a whole collection.
///
/// # Description
///
/// Each step first records whether the current window is a valid cluster, then
/// tries to admit the next frontier peak. A rejected peak makes the scan emit
/// the window average (if a valid state was seen since the last emission) and
/// evict the oldest member. Once the last peak has been admitted the window is
/// drained from the left until it becomes valid or empty.
///
/// The scan is greedy and never revisits a decision: results depend on the
/// order in which peaks leave the frontier.
///
pub struct AlignmentScan<'a> {
    frontier: MergeFrontier<'a>,
    window: ActiveWindow,
    config: AlignmentConfig,
    num_spectra: usize,
    num_peaks: usize,
    state: ScanState,
    found_since_last_reset: bool,
    tentative: Vec<AlignmentCluster>,
}

impl<'a> AlignmentScan<'a> {
    /// Prepares a scan over `spectra`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the configuration is rejected, `EmptySpectrum` if a
    /// spectrum holds no peaks.
    pub fn new(spectra: &'a SpectrumCollection, config: &AlignmentConfig) -> Result<Self> {
        config.validate()?;

        let frontier = MergeFrontier::new(spectra)?;
        let window = ActiveWindow::from_config(spectra.num_spectra(), config);
        let state = if frontier.is_empty() {
            ScanState::Done
        } else {
            ScanState::Scanning
        };

        Ok(AlignmentScan {
            frontier,
            window,
            config: config.clone(),
            num_spectra: spectra.num_spectra(),
            num_peaks: spectra.num_peaks(),
            state,
            found_since_last_reset: false,
            tentative: Vec::new(),
        })
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn window(&self) -> &ActiveWindow {
        &self.window
    }

    pub fn frontier(&self) -> &MergeFrontier<'a> {
        &self.frontier
    }

    /// Clusters emitted so far.
    pub fn tentative(&self) -> &[AlignmentCluster] {
        &self.tentative
    }

    /// Performs one admission attempt and whatever emission or eviction follows.
    pub fn step(&mut self) -> Result<ScanState> {
        if self.state == ScanState::Done {
            return Ok(ScanState::Done);
        }

        if self.window.is_valid(&self.frontier) {
            self.found_since_last_reset = true;
        }

        let inserted = self
            .window
            .try_insert(&mut self.frontier)
            .map_err(|e| self.violation("try_insert", e))?;

        if inserted {
            trace!("admitted peak, {}", self.window);
            if self.frontier.is_empty() {
                self.drain()?;
            }
        } else {
            if self.found_since_last_reset {
                self.emit();
                self.found_since_last_reset = false;
            }
            let evicted = self
                .window
                .evict_oldest()
                .map_err(|e| self.violation("evict_oldest", e))?;
            trace!("evicted peak {}", evicted);
        }

        if self.frontier.is_empty() {
            self.state = ScanState::Done;
        }
        Ok(self.state)
    }

    /// Runs the scan to completion and resolves overlapping points.
    pub fn run(mut self) -> Result<AlignmentReport> {
        while self.step()? == ScanState::Scanning {}
        Ok(self.into_report())
    }

    fn drain(&mut self) -> Result<()> {
        while !self.window.is_empty() {
            if self.window.is_valid(&self.frontier) {
                self.emit();
                break;
            }
            self.window
                .evict_oldest()
                .map_err(|e| self.violation("drain", e))?;
        }
        Ok(())
    }

    fn emit(&mut self) {
        let cluster = AlignmentCluster::from_window(&self.window);
        debug!("alignment point found at m/z {}: {}", cluster.mz, self.window);
        self.tentative.push(cluster);
    }

    fn violation(&self, context: &str, error: AlignmentError) -> AlignmentError {
        match error {
            AlignmentError::ContractViolation { .. } => error,
            other => AlignmentError::ContractViolation {
                context: format!("{}: {}", context, other),
                frontier_size: self.frontier.len(),
                window: self.window.to_string(),
            },
        }
    }

    fn into_report(self) -> AlignmentReport {
        let points: Vec<f64> = self.tentative.iter().map(|cluster| cluster.mz).collect();
        let alignment_points = remove_overlaps(&points, self.config.window_size);
        let overlaps_removed = points.len() - alignment_points.len();

        info!(
            "aligned {} peaks from {} spectra at window size {}: {} tentative points, {} removed as overlapping, {} alignment points",
            self.num_peaks,
            self.num_spectra,
            self.config.window_size,
            points.len(),
            overlaps_removed,
            alignment_points.len()
        );

        AlignmentReport {
            window_size: self.config.window_size,
            require_all_spectra: self.config.require_all_spectra,
            num_spectra: self.num_spectra,
            num_peaks: self.num_peaks,
            tentative: self.tentative,
            alignment_points,
            overlaps_removed,
        }
    }
}

/// Runs a complete alignment over `spectra` with the given configuration.
pub fn align(spectra: &SpectrumCollection, config: &AlignmentConfig) -> Result<AlignmentReport> {
    AlignmentScan::new(spectra, config)?.run()
}

/// Returns the alignment points of a run before overlap removal.
pub fn tentative_alignment_points(spectra: &SpectrumCollection, config: &AlignmentConfig) -> Result<Vec<f64>> {
    Ok(align(spectra, config)?.tentative_points())
}

/// Detects alignment points across a set of spectra.
///
/// # Arguments
///
/// * `spectra` - one ascending list of m/z values per spectrum; none may be empty.
/// * `window_size` - relative tolerance, e.g. `1e-5` for 10 ppm.
///
/// # Returns
///
/// The ascending, non-overlapping alignment points.
///
/// # Example
///
/// ```rust
/// # use mzalign::detect_alignment_points;
/// let spectra = vec![
///     vec![1.0, 2.1, 3.0, 7.0],
///     vec![1.0, 3.0, 4.0, 6.9],
///     vec![2.0, 3.0, 7.1],
/// ];
/// let points = detect_alignment_points(&spectra, 0.05).unwrap();
/// assert!((points.last().unwrap() - 7.0).abs() < 1e-9);
/// ```
pub fn detect_alignment_points(spectra: &[Vec<f64>], window_size: f64) -> Result<Vec<f64>> {
    let collection = SpectrumCollection::new(spectra.to_vec())?;
    let report = align(&collection, &AlignmentConfig::new(window_size))?;
    Ok(report.alignment_points)
}

/// Runs one independent alignment per window size on a dedicated thread pool.
///
/// `config.window_size` is replaced by each entry of `window_sizes`;
/// `config.num_threads` sizes the pool. Reports come back in the order of
/// `window_sizes`.
///
/// # Errors
///
/// `InvalidInput` if `num_threads` is zero or any window size is rejected.
pub fn detect_alignment_points_batch(
    spectra: &SpectrumCollection,
    window_sizes: &[f64],
    config: &AlignmentConfig,
) -> Result<Vec<AlignmentReport>> {
    if config.num_threads == 0 {
        return Err(AlignmentError::invalid_input("number of threads must be at least 1"));
    }

    let thread_pool = ThreadPoolBuilder::new().num_threads(config.num_threads).build()?;

    thread_pool.install(|| {
        window_sizes
            .par_iter()
            .map(|&window_size| align(spectra, &config.clone().with_window_size(window_size)))
            .collect()
    })
}
