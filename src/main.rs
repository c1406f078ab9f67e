//! Storefront Harvest main entry point
//!
//! This is the command-line interface for the Storefront Harvest catalog extractor.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use storefront_harvest::config::{load_config_with_hash, Config};
use storefront_harvest::crawler::{build_http_client, crawl};
use storefront_harvest::images::ImagePipeline;
use storefront_harvest::output::{
    export_by_category, load_statistics, print_statistics, CsvExporter,
};
use storefront_harvest::storage::{open_storage, ListingStore, SqliteStorage};
use tracing_subscriber::EnvFilter;

/// Storefront Harvest: a catalog extractor for paginated storefronts
///
/// Storefront Harvest walks a storefront's catalog page by page, stores every
/// listing in SQLite, downloads resized listing images, and exports the
/// catalog as CSV grouped by category.
#[derive(Parser, Debug)]
#[command(name = "storefront-harvest")]
#[command(version)]
#[command(about = "A catalog extractor for paginated storefronts", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Crawl the storefront and reconcile listings with the database
    Scrape,
    /// Download and resize images of stored listings
    Images,
    /// Export stored listings as CSV grouped by category
    Export,
    /// Scrape, then download images, then export
    All,
    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("opening database {}", config.output.database_path))?;

    match cli.command {
        Command::Scrape => handle_scrape(&config, &mut storage).await?,
        Command::Images => handle_images(&config, &storage).await?,
        Command::Export => handle_export(&config, &storage)?,
        Command::All => {
            handle_scrape(&config, &mut storage).await?;
            handle_images(&config, &storage).await?;
            handle_export(&config, &storage)?;
        }
        Command::Stats => handle_stats(&config, &storage)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("storefront_harvest=info,warn"),
            1 => EnvFilter::new("storefront_harvest=debug,info"),
            2 => EnvFilter::new("storefront_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(io::stderr)
        .init();
}

/// Warns when a step that reads the database runs before any scrape
fn warn_if_empty(storage: &SqliteStorage, step: &str) -> anyhow::Result<bool> {
    let count = storage.count_listings()?;
    if count == 0 {
        tracing::warn!(
            "The database has no listings, nothing to {}. Run the 'scrape' command first.",
            step
        );
    }
    Ok(count == 0)
}

/// Handles the scrape command: crawls every catalog page
async fn handle_scrape(config: &Config, storage: &mut SqliteStorage) -> anyhow::Result<()> {
    tracing::info!("Scraping {}{}", config.site.base_url, config.site.listings_path);

    match crawl(config, storage).await {
        Ok(report) => {
            tracing::info!(
                "Scrape completed: {} listings found on {} pages",
                report.listings_found,
                report.pages_visited.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the images command: downloads and resizes listing images
async fn handle_images(config: &Config, storage: &SqliteStorage) -> anyhow::Result<()> {
    if warn_if_empty(storage, "download")? {
        return Ok(());
    }

    let sources = storage.list_image_sources()?;
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(config.images.download_timeout_secs),
    )
    .context("building HTTP client")?;

    let pipeline = ImagePipeline::new(client, &config.output.images_dir, &config.images);
    let report = pipeline.run(&sources).await;

    if report.failed > 0 {
        tracing::warn!(
            "{} listings failed, re-run 'images' to retry them",
            report.failed
        );
    }
    Ok(())
}

/// Handles the export command: writes the CSV file or standard output
fn handle_export(config: &Config, storage: &SqliteStorage) -> anyhow::Result<()> {
    if warn_if_empty(storage, "export")? {
        return Ok(());
    }

    match &config.output.csv_path {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("creating {}", path))?;
            let mut exporter = CsvExporter::new(file);
            export_by_category(storage, &mut exporter)?;
            tracing::info!("CSV exported to: {}", path);
        }
        None => {
            let mut exporter = CsvExporter::new(io::stdout().lock());
            export_by_category(storage, &mut exporter)?;
        }
    }

    Ok(())
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config, storage: &SqliteStorage) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let stats = load_statistics(storage)?;
    print_statistics(&stats);

    Ok(())
}
