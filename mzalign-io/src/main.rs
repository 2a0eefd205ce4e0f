use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};
use log::info;
use mzalign::{align, detect_alignment_points_batch, AlignmentConfig, SpectrumCollection};
use mzalign_io::data::reader::{read_config_file, read_spectra_file};
use mzalign_io::data::writer::{output_path_for_window, write_alignment_points_file, write_report_json_file};

#[derive(Parser, Debug)]
#[command(author, version, about = "Detect alignment points across mass spectra peak lists", long_about = None)]
struct Cli {
    /// Peak list file: comma-separated m/z values, one spectrum per line
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Relative window size(s), comma separated (e.g. 1e-5,2e-5)
    #[arg(short, long, value_delimiter = ',')]
    window_size: Vec<f64>,

    /// Output path for the alignment points
    #[arg(short, long, default_value = "alignmentPoints.txt", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Optional JSON report with the clusters behind every point
    #[arg(long, value_hint = ValueHint::FilePath)]
    json: Option<PathBuf>,

    /// Only accept clusters holding a peak from every spectrum
    #[arg(long, action = ArgAction::SetTrue)]
    require_all_spectra: bool,

    /// Sort every spectrum before aligning
    #[arg(long, action = ArgAction::SetTrue)]
    sort_input: bool,

    /// Worker threads when several window sizes are given
    #[arg(long)]
    threads: Option<usize>,

    /// JSON file with an alignment configuration; flags override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Combines the optional config file with the command-line flags.
    fn alignment_config(&self) -> Result<AlignmentConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => read_config_file(path)?,
            None => AlignmentConfig::default(),
        };

        if let Some(&window_size) = self.window_size.first() {
            config.window_size = window_size;
        }
        if self.require_all_spectra {
            config.require_all_spectra = true;
        }
        if let Some(threads) = self.threads {
            config.num_threads = threads;
        }

        config.validate()?;
        Ok(config)
    }

    fn window_sizes(&self, config: &AlignmentConfig) -> Vec<f64> {
        if self.window_size.is_empty() {
            vec![config.window_size]
        } else {
            self.window_size.clone()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let cli = Cli::parse();
    let config = cli.alignment_config()?;
    let window_sizes = cli.window_sizes(&config);

    let mut spectra = SpectrumCollection::new(read_spectra_file(&cli.input)?)?;
    if cli.sort_input {
        spectra = spectra.sorted();
    }
    info!("{}", spectra);

    let reports = if window_sizes.len() == 1 {
        vec![align(&spectra, &config)?]
    } else {
        detect_alignment_points_batch(&spectra, &window_sizes, &config)?
    };

    for report in &reports {
        let path = if reports.len() == 1 {
            cli.output.clone()
        } else {
            output_path_for_window(&cli.output, report.window_size)
        };
        write_alignment_points_file(&path, &report.alignment_points)?;
        info!(
            "wrote {} alignment points to {}",
            report.alignment_points.len(),
            path.display()
        );
    }

    if let Some(path) = &cli.json {
        write_report_json_file(path, &reports)?;
        info!("wrote report to {}", path.display());
    }

    Ok(())
}
