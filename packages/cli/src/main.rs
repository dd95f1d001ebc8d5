#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line driver for hotspot analysis.
//!
//! Reads point records from a JSON or CSV file, runs kernel density
//! estimation and Gi* over them, and writes the combined result as JSON or
//! one of the layers as `GeoJSON`.

mod loader;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use crime_hotspot_analysis::{
    CancelToken, aggregate_by_location, analyze_with_cancel, gi_star_to_geojson, kde_to_geojson,
    suggested_threshold,
};
use crime_hotspot_analysis_models::{AnalysisOptions, Kernel, RawPoint, WeightType};

#[derive(Parser)]
#[command(name = "crime_hotspot_cli", about = "Kernel density and Gi* hotspot analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// What `analyze` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full result: density grid, Gi* results, summary, and points.
    Json,
    /// Gi* results as a `GeoJSON` `FeatureCollection`.
    GeojsonHotspots,
    /// Density grid cells as a `GeoJSON` `FeatureCollection`.
    GeojsonDensity,
}

#[derive(Subcommand)]
enum Commands {
    /// Run density estimation and hotspot analysis.
    Analyze {
        /// Points file (`.json` array of objects, or `.csv` with a header).
        #[arg(long)]
        input: PathBuf,

        /// TOML options file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Merge records that share a location before analyzing.
        #[arg(long)]
        aggregate: bool,

        /// Abort if the analysis takes longer than this.
        #[arg(long)]
        timeout_secs: Option<u64>,

        #[arg(long)]
        kde_resolution: Option<u32>,

        /// Bandwidth in km.
        #[arg(long)]
        kde_bandwidth: Option<f64>,

        #[arg(long)]
        kernel: Option<Kernel>,

        /// Gi* neighbor distance in km.
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        weight_type: Option<WeightType>,

        /// Drop density cells below this normalized density from
        /// `geojson-density` output.
        #[arg(long, default_value = "0")]
        min_density: f64,
    },

    /// Print the adaptive Gi* distance threshold for a points file.
    Threshold {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        aggregate: bool,
    },
}

fn load(input: &Path, aggregate: bool) -> Result<Vec<RawPoint>, Box<dyn std::error::Error>> {
    let records = loader::load_points(input)?;
    if aggregate {
        Ok(aggregate_by_location(&records)?)
    } else {
        Ok(records)
    }
}

fn write_json(
    output: Option<&Path>,
    value: &impl serde::Serialize,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
        log::info!("Wrote {}", path.display());
    } else {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, value)?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            format,
            aggregate,
            timeout_secs,
            kde_resolution,
            kde_bandwidth,
            kernel,
            threshold,
            weight_type,
            min_density,
        } => {
            let mut options = match &config {
                Some(path) => loader::load_options(path)?,
                None => AnalysisOptions::default(),
            };
            if let Some(resolution) = kde_resolution {
                options.kde_resolution = resolution;
            }
            if kde_bandwidth.is_some() {
                options.kde_bandwidth = kde_bandwidth;
            }
            if let Some(kernel) = kernel {
                options.kernel = kernel;
            }
            if threshold.is_some() {
                options.gi_distance_threshold = threshold;
            }
            if let Some(weight_type) = weight_type {
                options.gi_weight_type = weight_type;
            }

            let records = load(&input, aggregate)?;
            let cancel = timeout_secs.map_or_else(CancelToken::new, |secs| {
                CancelToken::with_timeout(Duration::from_secs(secs))
            });

            let result = analyze_with_cancel(&records, &options, &cancel)?;

            match format {
                OutputFormat::Json => write_json(output.as_deref(), &result)?,
                OutputFormat::GeojsonHotspots => write_json(
                    output.as_deref(),
                    &gi_star_to_geojson(&result.gi_star.results)?,
                )?,
                OutputFormat::GeojsonDensity => write_json(
                    output.as_deref(),
                    &kde_to_geojson(&result.kde, min_density)?,
                )?,
            }
        }
        Commands::Threshold { input, aggregate } => {
            let records = load(&input, aggregate)?;
            let threshold = suggested_threshold(&records, &CancelToken::new())?;
            println!("{threshold:.3}");
        }
    }

    Ok(())
}
