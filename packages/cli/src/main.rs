#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the locator pipeline.
//!
//! `locator geocode` loads an address CSV from a file or URL, geocodes
//! every unique address, and prints the coordinated records as JSON on
//! stdout for the map layer to consume. Logs and the progress bar go to
//! stderr. Ctrl-C lets the in-flight batch finish and then prints what
//! has been resolved so far.

use std::io::Write as _;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use locator_cli_utils::GeocodeBar;
use locator_geocoder::fallback::{CONTINENTAL_DEFAULT, STATE_CENTROIDS};
use locator_geocoder::mapbox::MapboxGeocoder;
use locator_geocoder::service_registry::{GeocodingService, default_service};
use locator_ingest::scheduler::ScheduleConfig;
use locator_ingest::{InputSource, Pipeline};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "locator", about = "Address CSV geocoding tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode every row of an address CSV and print the result as JSON
    Geocode {
        /// Path or `http(s)://` URL of the CSV
        #[arg(long)]
        input: String,
        /// Geocoding service TOML replacing the embedded Mapbox defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Unique addresses geocoded concurrently per batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Pause between batches in milliseconds
        #[arg(long)]
        batch_delay_ms: Option<u64>,
        /// Seed for fallback jitter (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List the fallback centroid used for each state code
    Fallbacks,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = locator_cli_utils::init_logger("info");
    let cli = Cli::parse();

    match cli.command {
        Commands::Geocode {
            input,
            config,
            batch_size,
            batch_delay_ms,
            seed,
            pretty,
        } => {
            let start = Instant::now();

            let service = match config {
                Some(path) => GeocodingService::load_from_path(&path)?,
                None => default_service(),
            };

            let mut schedule = ScheduleConfig::from(service.batch);
            if let Some(n) = batch_size {
                schedule.batch_size = n;
            }
            if let Some(ms) = batch_delay_ms {
                schedule.batch_delay = Duration::from_millis(ms);
            }

            let geocoder = MapboxGeocoder::from_service(&service)?;
            let mut pipeline = Pipeline::for_service(geocoder, &service).with_schedule(schedule);
            if let Some(seed) = seed {
                pipeline = pipeline.with_seed(seed);
            }

            log::info!(
                "Geocoding with {} (batch size {}, delay {:?})",
                service.name,
                pipeline.schedule().batch_size,
                pipeline.schedule().batch_delay
            );

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupted; finishing the current batch...");
                    ctrl_c.cancel();
                }
            });

            let bar = GeocodeBar::new(&multi, "geocode").into_callback();
            let result = pipeline
                .run(&InputSource::from_location(&input), bar, &cancel)
                .await?;

            if result.cancelled {
                log::warn!(
                    "Stopped early: {}/{} addresses processed",
                    result.progress.processed,
                    result.progress.total
                );
            }

            let mut stdout = std::io::stdout().lock();
            if pretty {
                serde_json::to_writer_pretty(&mut stdout, &result.records)?;
            } else {
                serde_json::to_writer(&mut stdout, &result.records)?;
            }
            writeln!(stdout)?;

            log::info!(
                "Done in {:.1}s: {} records, {} geocoded, {} fallback",
                start.elapsed().as_secs_f64(),
                result.records.len(),
                result.geocoded,
                result.fallback
            );
        }
        Commands::Fallbacks => {
            println!("{:<8} {:>10} {:>12}", "STATE", "LAT", "LNG");
            println!("{}", "-".repeat(32));
            for (state, c) in STATE_CENTROIDS {
                println!("{state:<8} {:>10.4} {:>12.4}", c.latitude, c.longitude);
            }
            println!(
                "{:<8} {:>10.4} {:>12.4}",
                "(other)", CONTINENTAL_DEFAULT.latitude, CONTINENTAL_DEFAULT.longitude
            );
        }
    }

    Ok(())
}
