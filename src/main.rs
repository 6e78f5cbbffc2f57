use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use kpbench::{BenchConfig, Harness, RegionOfInterest};

#[derive(Parser)]
#[command(name = "kpbench")]
#[command(about = "Count keypoints per detector and frame inside a region of interest")]
struct Cli {
    /// JSON configuration file (defaults are used for missing keys)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root directory the image sequence is resolved against
    #[arg(long, value_name = "DIR")]
    data_path: Option<PathBuf>,

    /// First frame index to load
    #[arg(long)]
    start: Option<usize>,

    /// Last frame index to load
    #[arg(long)]
    end: Option<usize>,

    /// Comma separated detector list, e.g. FAST,ORB
    #[arg(long, value_delimiter = ',')]
    detectors: Option<Vec<String>>,

    /// Region of interest as x,y,width,height
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    roi: Option<Vec<i32>>,

    /// Count keypoints over the whole image
    #[arg(long)]
    no_roi: bool,

    /// Limit the keypoints kept on each buffered frame
    #[arg(long, value_name = "N")]
    max_keypoints: Option<usize>,

    /// Destination of the CSV table
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the default configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default_config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, mut config: BenchConfig) -> anyhow::Result<BenchConfig> {
        if let Some(path) = &self.data_path {
            config.data_path = path.clone();
        }
        if let Some(start) = self.start {
            config.img_start_index = start;
        }
        if let Some(end) = self.end {
            config.img_end_index = end;
        }
        if let Some(detectors) = &self.detectors {
            config.detectors = detectors.clone();
        }
        match self.roi.as_deref() {
            Some(&[x, y, width, height]) => config.roi = RegionOfInterest::new(x, y, width, height),
            Some(other) => anyhow::bail!("--roi expects x,y,width,height, got {} values", other.len()),
            None => {}
        }
        if self.no_roi {
            config.focus_on_roi = false;
        }
        if self.max_keypoints.is_some() {
            config.max_keypoints = self.max_keypoints;
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(path) = &args.write_default_config {
        BenchConfig::default()
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };
    let config = args.apply(config)?;
    config.log_summary();

    let harness = Harness::new(config).context("Invalid benchmark configuration")?;
    let (matrix, path) = harness.run_and_export().context("Benchmark run aborted")?;

    println!("\n=== Keypoints in region of interest ===");
    for (row, detector) in matrix.detectors().iter().enumerate() {
        let counts = matrix
            .row(row)
            .unwrap_or_default()
            .iter()
            .map(|c| format!("{:>5}", c))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<10} {}", detector.name(), counts);
    }
    println!("\nResults saved to {}", path.display());

    Ok(())
}
