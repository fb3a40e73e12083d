//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner page harvester.

use anyhow::Context;
use clap::Parser;
use gleaner::config::{load_config_with_hash, Config};
use gleaner::crawler::Coordinator;
use gleaner::output::{load_statistics, log_run_summary, print_statistics};
use gleaner::storage::open_storage;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit code for a run stopped by Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// Gleaner: a resilient, browser-driven page harvester
///
/// Gleaner visits a fixed list of pages through a headless browser, extracts
/// structured content with site-aware strategies and stores it in SQLite
/// together with an audit log of every target.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A resilient, browser-driven page harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(ExitCode::SUCCESS)
    } else if cli.stats {
        handle_stats(&config)?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_run(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG` takes precedence over the flags when set.
fn setup_logging(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "gleaner=info,warn",
            1 => "gleaner=debug,info",
            2 => "gleaner=trace,debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated settings and targets
fn handle_dry_run(config: &Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Max retries: {}", config.scraper.max_retries);
    println!("  Wait timeout: {}s", config.scraper.wait_timeout);
    println!("  Headless: {}", config.scraper.headless);
    println!("  Min content bytes: {}", config.scraper.min_content_bytes);
    println!("  Base delay: {}s", config.scraper.base_delay);
    println!(
        "  Respect robots.txt: {} (agent: {})",
        config.scraper.respect_robots_txt, config.scraper.robots_agent
    );
    match config.scraper.seed {
        Some(seed) => println!("  Seed: {}", seed),
        None => println!("  Seed: random"),
    }

    println!("\nPacing:");
    for (label, range) in [
        ("Pre-navigation", config.pacing.pre_navigation),
        ("Between targets", config.pacing.between_targets),
        ("Backoff jitter", config.pacing.jitter),
    ] {
        println!("  {}: {}s - {}s", label, range.min, range.max);
    }

    println!("\nRelay Endpoints ({}):", config.relay.endpoints.len());
    for endpoint in &config.relay.endpoints {
        println!("  - {}", endpoint);
    }
    if !config.relay.endpoints.is_empty() {
        println!("  Probe: {} ({}s)", config.relay.probe_url, config.relay.probe_timeout);
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nTargets ({}):", config.targets.urls.len());
    for url in &config.targets.urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} targets in shuffled order",
        config.targets.urls.len()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let stats = load_statistics(&storage).context("Failed to load statistics")?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest run
///
/// # Returns
///
/// * `Ok(ExitCode)` - 0 for a completed run, 130 for an interrupted one
/// * `Err(anyhow::Error)` - The run could not be set up
async fn handle_run(config: Config) -> anyhow::Result<ExitCode> {
    let database = Path::new(&config.output.database_path);
    if let Some(parent) = database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current target");
            signal_token.cancel();
        }
    });

    tracing::info!(
        targets = config.targets.urls.len(),
        endpoints = config.relay.endpoints.len(),
        "Starting harvest"
    );

    let mut coordinator = Coordinator::from_config(&config, cancel)
        .await
        .context("Failed to initialize run")?;
    let summary = coordinator.run(&config.targets.urls).await;
    log_run_summary(&summary);

    if summary.interrupted {
        Ok(ExitCode::from(EXIT_INTERRUPTED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
