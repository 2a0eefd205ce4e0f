use itertools::Itertools;

/// Returns `true` if the tolerance windows around two ascending points touch.
///
/// # Example
///
/// ```rust
/// # use mzalign::algorithm::overlap::windows_overlap;
/// assert!(windows_overlap(100.0, 100.1, 0.001));
/// assert!(!windows_overlap(100.0, 200.0, 0.001));
/// ```
pub fn windows_overlap(lower: f64, upper: f64, window_size: f64) -> bool {
    lower * (1.0 + window_size) >= upper * (1.0 - window_size)
}

/// Marks every point whose window overlaps the window of a neighbour.
///
/// # Arguments
///
/// * `points` - tentative alignment points in ascending order
/// * `window_size` - relative tolerance used by the scan
///
/// # Returns
///
/// One flag per point, `true` if the point overlaps either neighbour.
pub fn overlap_mask(points: &[f64], window_size: f64) -> Vec<bool> {
    let mut overlapping = vec![false; points.len()];

    for (i, (&lower, &upper)) in points.iter().tuple_windows().enumerate() {
        if windows_overlap(lower, upper, window_size) {
            overlapping[i] = true;
            overlapping[i + 1] = true;
        }
    }

    overlapping
}

/// Drops every tentative alignment point whose window overlaps a neighbour.
///
/// Overlapping points are removed entirely, not merged; the survivors keep
/// their order.
///
/// # Example
///
/// ```rust
/// # use mzalign::algorithm::overlap::remove_overlaps;
/// let points = vec![100.0, 100.1, 200.0];
/// assert_eq!(remove_overlaps(&points, 0.001), vec![200.0]);
/// ```
pub fn remove_overlaps(points: &[f64], window_size: f64) -> Vec<f64> {
    let mask = overlap_mask(points, window_size);

    points
        .iter()
        .zip(mask)
        .filter(|(_, overlapping)| !overlapping)
        .map(|(&point, _)| point)
        .collect()
}
