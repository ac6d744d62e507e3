//! chara-scrape main entry point
//!
//! This is the command-line interface for the chara-scrape image harvester.

use anyhow::Context;
use chara_scrape::config::{load_raw_config_with_hash, validate, Config};
use chara_scrape::output::print_summary;
use chara_scrape::Pipeline;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// chara-scrape: A polite character image harvester
///
/// chara-scrape reads a wiki's character list, visits every character page, collects
/// the images found under the configured sections and saves them under numbered file
/// names. An interrupted run picks up at the first unfinished stage.
#[derive(Parser, Debug)]
#[command(name = "chara-scrape")]
#[command(version)]
#[command(about = "A polite character image harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory receiving the images
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Directory holding intermediate artifacts
    #[arg(short, long, value_name = "DIR")]
    temp: Option<PathBuf>,

    /// Keep intermediate artifacts after a complete run
    #[arg(short, long)]
    keep_temp: bool,

    /// Ignore artifacts and images from earlier runs
    #[arg(long)]
    fresh: bool,

    /// Minimum milliseconds between requests
    #[arg(long, value_name = "MS")]
    interval: Option<u64>,

    /// Do not draw progress bars
    #[arg(long)]
    no_progress: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show where a run would start without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(config, cli.fresh).await
    } else {
        handle_run(config, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("chara_scrape=info,warn"),
            1 => EnvFilter::new("chara_scrape=debug,info"),
            2 => EnvFilter::new("chara_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any), applies CLI overrides and validates the result
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_raw_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(output) = &cli.output {
        config.output.output_dir = output.clone();
    }
    if let Some(temp) = &cli.temp {
        config.output.temp_dir = temp.clone();
    }
    if cli.keep_temp {
        config.output.keep_temp = true;
    }
    if let Some(interval) = cli.interval {
        config.scraper.get_interval = interval;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the configuration and the resume point
async fn handle_dry_run(config: Config, fresh: bool) -> anyhow::Result<()> {
    println!("=== chara-scrape Dry Run ===\n");

    println!("Scraper:");
    println!("  Listing URL: {}", config.scraper.listing_url);
    println!("  Image base URL: {}", config.scraper.image_base_url);
    println!("  Request interval: {}ms", config.scraper.get_interval);
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.scraper.request_timeout, config.scraper.connect_timeout
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Images: {}", config.output.output_dir.display());
    println!("  Temp: {}", config.output.temp_dir.display());
    println!("  Keep temp: {}", config.output.keep_temp);

    println!("\nSections ({}):", config.selectors.section_markers.len());
    for marker in &config.selectors.section_markers {
        println!("  - {}", marker);
    }

    let pipeline = Pipeline::new(config).context("Failed to set up pipeline")?;
    let start = if fresh {
        chara_scrape::Stage::FetchListing
    } else {
        pipeline
            .resume_point()
            .await
            .context("Failed to inspect existing artifacts")?
    };

    println!("\n✓ Configuration is valid");
    println!("✓ A run would start at: {}", start);

    Ok(())
}

/// Handles the main scraping run
async fn handle_run(config: Config, cli: &Cli) -> anyhow::Result<()> {
    let show_progress = !cli.no_progress && !cli.quiet;
    let pipeline = Pipeline::new(config)
        .context("Failed to set up pipeline")?
        .fresh(cli.fresh)
        .show_progress(show_progress);

    let summary = pipeline.run().await.context("Run failed")?;
    tracing::info!("Run completed successfully");

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}
