//! firm-harvest main entry point
//!
//! This is the command-line interface for the firm-harvest directory harvester.

use anyhow::Context;
use clap::Parser;
use firm_harvest::config::{load_config_with_hash, Config};
use firm_harvest::output::{print_statistics, CrawlStatistics};
use firm_harvest::{CrawlPhase, Harvester};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// firm-harvest: export a paginated firm directory to a spreadsheet
///
/// Walks every listing page of the directory, follows each entry to its
/// detail page, and writes the harvested name, address, website and email
/// of every firm to an XLSX report.
#[derive(Parser, Debug)]
#[command(name = "firm-harvest")]
#[command(version)]
#[command(about = "Harvests a paginated firm directory into a spreadsheet", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the report (overrides output.report-path)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.report_path));

    if cli.dry_run {
        handle_dry_run(&config, &output)
    } else {
        handle_crawl(config, &output, cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("firm_harvest=info,warn"),
            1 => EnvFilter::new("firm_harvest=debug,info"),
            2 => EnvFilter::new("firm_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, output: &Path) -> anyhow::Result<()> {
    println!("=== firm-harvest Dry Run ===\n");

    println!("Directory:");
    println!("  Base URL: {}", config.directory.base_url);
    println!("  Location: {}", config.directory.location);
    println!("  First listing page: {}", config.directory.listing_url(1)?);

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!(
        "  Viewport: {}x{}",
        config.fetcher.viewport_width, config.fetcher.viewport_height
    );
    println!("  Timeout: {}ms", config.fetcher.timeout_ms);

    println!("\nLimits:");
    println!("  Max pages: {}", describe_limit(config.limits.max_pages));
    println!("  Max entries: {}", describe_limit(config.limits.max_entries));
    println!(
        "  Max duration: {}",
        describe_limit(config.limits.max_duration_secs.map(|s| format!("{}s", s)))
    );

    println!("\nOutput:");
    println!("  Report: {}", output.display());
    println!("  Sheet: {}", config.output.sheet_name);

    println!("\n✓ Configuration is valid");

    Ok(())
}

fn describe_limit<T: std::fmt::Display>(limit: Option<T>) -> String {
    limit.map_or_else(|| "unbounded".to_string(), |value| value.to_string())
}

/// Handles the main crawl: start, poll progress, write the report
async fn handle_crawl(config: Config, output: &Path, quiet: bool) -> anyhow::Result<()> {
    let poll_interval = Duration::from_millis(config.output.poll_interval_ms);
    let harvester = Harvester::new(config);

    harvester.start_crawl()?;

    let mut interval = tokio::time::interval(poll_interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let mut seen = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut ctrl_c, if !interrupted => {
                tracing::warn!("Interrupt received, cancelling crawl");
                harvester.cancel();
                interrupted = true;
            }
        }

        seen = print_new_log(&harvester, seen, quiet);
        if harvester.progress().phase.is_terminal() {
            break;
        }
    }

    let phase = harvester.join().await;
    print_new_log(&harvester, seen, quiet);

    if !quiet {
        println!();
        print_statistics(&CrawlStatistics::from_state(&harvester.state().snapshot()));
    }

    if phase != CrawlPhase::Complete {
        anyhow::bail!("crawl did not complete (status: {})", phase);
    }

    let artifact = harvester.artifact()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, &artifact.bytes)
        .with_context(|| format!("failed to write report to {}", output.display()))?;

    if !quiet {
        println!("\n✓ Report written to: {}", output.display());
    }

    Ok(())
}

/// Prints log entries not yet shown and returns the new offset
fn print_new_log(harvester: &Harvester, seen: usize, quiet: bool) -> usize {
    let entries = harvester.log_since(seen);
    if !quiet {
        for entry in &entries {
            println!("{}", entry);
        }
    }
    seen + entries.len()
}
