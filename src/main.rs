use chrono::Utc;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use ips_tidy::importers::{downloader, OnsDownloader, WorkbookImporter};
use ips_tidy::output::{self, DatasetMetadata};
use ips_tidy::recode;

#[derive(Parser)]
#[command(name = "ips-tidy")]
#[command(about = "Tidy the ONS IPS 4.01 spreadsheet into observations.csv plus metadata", long_about = None)]
struct Cli {
    /// Base URL of the ONS site (override for mirrors or testing)
    #[arg(long, env = "ONS_BASE_URL")]
    base_url: Option<String>,

    /// Path to a local copy of the spreadsheet; skips the download
    #[arg(long)]
    file: Option<PathBuf>,

    /// Directory the CSV and metadata files are written to
    #[arg(long, env = "IPS_OUTPUT_DIR", default_value = "out")]
    output_dir: PathBuf,

    /// Keep the downloaded spreadsheet next to the outputs
    #[arg(long)]
    keep_download: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let start_time = Instant::now();

    std::fs::create_dir_all(&cli.output_dir)?;

    // Acquire the spreadsheet: local file or latest ONS distribution
    let download_start = Instant::now();
    let (workbook_path, source_url, downloaded) = match &cli.file {
        Some(path) => {
            if !path.exists() {
                error!("File not found: {path:?}");
                return Err(format!("File not found: {path:?}").into());
            }
            info!("Using local spreadsheet: {path:?}");
            (path.clone(), None, false)
        }
        None => {
            let ons = match &cli.base_url {
                Some(base) => OnsDownloader::with_base_url(base.clone()),
                None => OnsDownloader::new(),
            };

            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            pb.set_message("Resolving latest IPS 4.01 distribution...");

            let (url, bytes) = ons.download_latest().await?;
            pb.finish_with_message(format!(
                "✓ Downloaded {:.1} KB",
                bytes.len() as f64 / 1024.0
            ));

            let path = cli
                .output_dir
                .join(downloader::distribution_filename(&url));
            std::fs::write(&path, &bytes)?;
            info!("Saved spreadsheet to: {path:?}");
            (path, Some(url), true)
        }
    };
    let download_duration = download_start.elapsed();

    // Parse Data sheets (blocking operation)
    let parse_start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Parsing Data sheets...");

    let path_str = workbook_path.to_string_lossy().to_string();
    let tables = tokio::task::spawn_blocking(move || {
        let importer = WorkbookImporter::new(&path_str);
        importer.parse_workbook()
    })
    .await??;

    let sheet_count = tables.len();
    let observations: Vec<_> = tables
        .into_iter()
        .flat_map(|table| table.observations)
        .collect();
    let parse_duration = parse_start.elapsed();
    pb.finish_with_message(format!(
        "✓ Parsed {} observations from {sheet_count} sheets",
        observations.len()
    ));

    // Recode and write outputs
    let write_start = Instant::now();
    let rows = recode::tidy_observations(&observations)?;
    let dataset = DatasetMetadata::ips_4_01(source_url.clone(), Utc::now());
    let written = output::write_all(&cli.output_dir, &rows, &dataset)?;
    let write_duration = write_start.elapsed();

    if downloaded && !cli.keep_download {
        std::fs::remove_file(&workbook_path)?;
        info!("Deleted downloaded spreadsheet: {workbook_path:?}");
    }

    let total_duration = start_time.elapsed();

    // Print run summary
    println!("\n{}", "=".repeat(60));
    println!("IPS 4.01 Conversion Summary");
    println!("{}", "=".repeat(60));
    match &source_url {
        Some(url) => println!("Source:             {url}"),
        None => println!("Source:             {workbook_path:?}"),
    }
    println!("Data Sheets:        {sheet_count}");
    println!("Observations:       {}", observations.len());
    println!("Tidy Rows:          {}", rows.len());
    println!("{}", "-".repeat(60));
    for path in &written {
        println!("Wrote:              {}", path.display());
    }
    println!("{}", "-".repeat(60));
    println!("Fetch Time:         {:.2}s", download_duration.as_secs_f64());
    println!("Parse Time:         {:.2}s", parse_duration.as_secs_f64());
    println!("Write Time:         {:.2}s", write_duration.as_secs_f64());
    println!("Total Time:         {:.2}s", total_duration.as_secs_f64());
    println!("{}", "=".repeat(60));
    println!();

    info!("Conversion completed successfully!");
    Ok(())
}
