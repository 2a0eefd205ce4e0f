use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use log::{info, warn};
use mzalign::AlignmentConfig;

use crate::error::IoError;

/// Parses one comma-separated peak list line into m/z values.
///
/// Whitespace around tokens is ignored, as are empty tokens (e.g. from a
/// trailing comma).
///
/// # Arguments
///
/// * `line` - the text of the line
/// * `line_number` - 1-based line number, used in error messages
///
/// # Example
///
/// ```rust
/// # use mzalign_io::data::reader::parse_spectrum_line;
/// let mz = parse_spectrum_line("100.5, 200.25,300,", 1).unwrap();
/// assert_eq!(mz, vec![100.5, 200.25, 300.0]);
/// assert!(parse_spectrum_line("100.5,abc", 1).is_err());
/// ```
pub fn parse_spectrum_line(line: &str, line_number: usize) -> Result<Vec<f64>, IoError> {
    line.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<f64>().map_err(|_| IoError::ParseFloat {
                line: line_number,
                token: token.to_string(),
            })
        })
        .collect()
}

/// Reads peak lists, one spectrum per non-blank line.
///
/// Lines whose values are not ascending are kept as they are and reported with
/// a warning; the alignment itself expects sorted spectra.
pub fn read_spectra<R: BufRead>(reader: R) -> Result<Vec<Vec<f64>>, IoError> {
    let mut spectra = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let line_number = index + 1;
        let mz = parse_spectrum_line(&line, line_number)?;
        if !mz.windows(2).all(|w| w[0] <= w[1]) {
            warn!("line {}: m/z values are not in ascending order", line_number);
        }
        spectra.push(mz);
    }

    Ok(spectra)
}

pub fn read_spectra_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let spectra = read_spectra(BufReader::new(file))?;
    info!("read {} spectra from {}", spectra.len(), path.display());
    Ok(spectra)
}

/// Loads an `AlignmentConfig` from a JSON file; missing fields take their defaults.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> Result<AlignmentConfig, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(serde_json::from_reader(BufReader::new(file))?)
}
