use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use mzalign::AlignmentReport;

use crate::error::IoError;

/// Writes alignment points as whitespace-separated text on a single line.
///
/// Every value is followed by a space and the line ends with a newline.
///
/// # Example
///
/// ```rust
/// # use mzalign_io::data::writer::write_alignment_points;
/// let mut out = Vec::new();
/// write_alignment_points(&mut out, &[1.0, 2.05, 7.0]).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "1 2.05 7 \n");
/// ```
pub fn write_alignment_points<W: Write>(mut writer: W, points: &[f64]) -> Result<(), IoError> {
    for point in points {
        write!(writer, "{} ", point)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File, IoError> {
    File::create(path).map_err(|source| IoError::Create {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_alignment_points_file<P: AsRef<Path>>(path: P, points: &[f64]) -> Result<(), IoError> {
    let file = create_file(path.as_ref())?;
    write_alignment_points(BufWriter::new(file), points)
}

/// Writes the reports of one or more runs as pretty-printed JSON.
pub fn write_report_json<W: Write>(mut writer: W, reports: &[AlignmentReport]) -> Result<(), IoError> {
    serde_json::to_writer_pretty(&mut writer, reports)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_report_json_file<P: AsRef<Path>>(path: P, reports: &[AlignmentReport]) -> Result<(), IoError> {
    let file = create_file(path.as_ref())?;
    write_report_json(BufWriter::new(file), reports)
}

/// Derives a per-run output path by appending the window size to the file stem.
///
/// # Example
///
/// ```rust
/// # use std::path::Path;
/// # use mzalign_io::data::writer::output_path_for_window;
/// let path = output_path_for_window(Path::new("out/alignmentPoints.txt"), 0.0005);
/// assert_eq!(path, Path::new("out/alignmentPoints_w0.0005.txt"));
/// ```
pub fn output_path_for_window(base: &Path, window_size: f64) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match base.extension() {
        Some(extension) => format!("{}_w{}.{}", stem, window_size, extension.to_string_lossy()),
        None => format!("{}_w{}", stem, window_size),
    };

    base.with_file_name(file_name)
}
