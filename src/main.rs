use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use catastici_merchants::{
    load_csv, read_columnar, write_columnar, write_csv, CoordinateSystem, ResolutionConfig,
    ResolutionPipeline, COLUMNAR_FILE_NAME, CSV_FILE_NAME,
};

#[derive(Parser)]
#[command(name = "catastici-merchants")]
#[command(version)]
#[command(about = "Resolve 1740 land-register tenants into merchant profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a register CSV into merchant profile tables
    Resolve {
        /// Pre-filtered register export (CSV)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for merchants_dataset.csv / merchants_dataset.bin
        #[arg(short, long)]
        out_dir: PathBuf,

        /// JSON config file (missing keys use defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the edge weight threshold
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Coordinates are projected meters (e.g. UTM 33N), not lat/lng degrees
        #[arg(long)]
        projected: bool,

        /// Worker threads for pairwise scoring
        #[arg(long)]
        threads: Option<usize>,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the profiles stored in a columnar table
    Inspect {
        /// merchants_dataset.bin
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            input,
            out_dir,
            config,
            threshold,
            projected,
            threads,
            report,
        } => {
            let mut config = match config {
                Some(path) => ResolutionConfig::from_file(&path)?,
                None => ResolutionConfig::default(),
            };
            if let Some(t) = threshold {
                config.threshold = t;
            }
            if projected {
                config.coordinate_system = CoordinateSystem::Projected;
            }
            if threads.is_some() {
                config.worker_threads = threads;
            }
            run_resolve(&input, &out_dir, config, report.as_deref())
        }
        Commands::Inspect { path } => run_inspect(&path),
    }
}

fn run_resolve(input: &Path, out_dir: &Path, config: ResolutionConfig, report: Option<&Path>) -> Result<()> {
    let pipeline = ResolutionPipeline::new(config)?;

    info!(input = ?input, "loading register records");
    let records = load_csv(input, pipeline.config().coordinate_system)?;
    info!(records = records.len(), "records ingested");

    let resolution = pipeline.run(&records)?;
    resolution.report.log_summary();

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    let csv_path = out_dir.join(CSV_FILE_NAME);
    let bin_path = out_dir.join(COLUMNAR_FILE_NAME);
    write_csv(&resolution.profiles, &csv_path)?;
    write_columnar(&resolution.profiles, &bin_path)?;
    info!(
        profiles = resolution.profiles.len(),
        csv = ?csv_path,
        columnar = ?bin_path,
        "merchant profiles saved"
    );

    if let Some(path) = report {
        let json = serde_json::to_string_pretty(&resolution.report)?;
        fs::write(path, json).with_context(|| format!("Failed to write report: {:?}", path))?;
        info!(report = ?path, "run report saved");
    }

    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let columns = read_columnar(path)?;

    println!("{} merchant profiles in {:?}", columns.len(), path);
    for i in 0..columns.len() {
        let home = match (columns.house_lat[i], columns.house_lng[i]) {
            (Some(lat), Some(lng)) => format!("({:.6}, {:.6})", lat, lng),
            _ => "unknown".to_string(),
        };
        println!(
            "  {:<40} shops={} [{}] home={}",
            columns.person[i],
            columns.shop_count[i],
            columns.shop_type[i].join(", "),
            home
        );
    }

    Ok(())
}
