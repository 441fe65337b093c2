//! Nav-Atlas main entry point
//!
//! Command-line front-end that runs one crawl job from a TOML configuration
//! file and prints the resulting site navigation structure.

use anyhow::Context;
use clap::Parser;
use nav_atlas::config::load_config;
use nav_atlas::events::TaskEvent;
use nav_atlas::service::DEFAULT_QUEUE_CAPACITY;
use nav_atlas::{crawl_service, BroadcastSink, HttpFetcher, TaskStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Nav-Atlas: a website structure mapper
///
/// Nav-Atlas crawls a website from a start URL, fetches its pages, and
/// extracts a deduplicated navigation structure, reporting progress as it
/// goes.
#[derive(Parser, Debug)]
#[command(name = "nav-atlas")]
#[command(version)]
#[command(about = "A website structure mapper", long_about = None)]
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

    /// Validate the config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    run_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("nav_atlas=info,warn"),
            1 => EnvFilter::new("nav_atlas=debug,info"),
            2 => EnvFilter::new("nav_atlas=trace,debug"),
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

/// Handles --dry-run: the config validated, so show the crawl plan
fn handle_dry_run(config: &nav_atlas::CrawlConfig) {
    println!("=== Nav-Atlas Dry Run ===\n");
    println!("Start URL:      {}", config.start_url);
    println!("Strategy:       {:?}", config.crawl_strategy);
    println!("Max depth:      {}", config.max_depth);
    println!("Max pages:      {}", config.max_pages);
    println!("Cache mode:     {:?}", config.cache_mode);
    println!("Word threshold: {}", config.word_threshold);
    if !config.filters.exclude_domains.is_empty() {
        println!("Excluded domains:  {:?}", config.filters.exclude_domains);
    }
    if !config.filters.exclude_patterns.is_empty() {
        println!("Excluded patterns: {:?}", config.filters.exclude_patterns);
    }
    println!("\nConfiguration is valid.");
}

/// Submits one job and runs it to a terminal status, printing the outcome
async fn run_crawl(config: nav_atlas::CrawlConfig) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new().context("failed to build HTTP client")?);
    let sink = Arc::new(BroadcastSink::new(256));

    let mut events = sink.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let TaskEvent::TaskUpdate {
                progress,
                status_text,
                ..
            } = event
            {
                tracing::info!("[{:>3}%] {}", progress, status_text);
            }
        }
    });

    let (service, worker) = crawl_service(fetcher, sink, DEFAULT_QUEUE_CAPACITY);
    tokio::spawn(worker.run());

    let id = service.submit(config)?;
    tracing::info!("Submitted task {}", id);

    // Wait for the task to reach a terminal status
    let snapshot = loop {
        let snapshot = service.snapshot(id)?;
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    };

    println!("\n=== Crawl Summary ===");
    println!("Status:     {}", snapshot.status);
    println!(
        "Pages:      {} discovered, {} crawled, {} failed",
        snapshot.stats.discovered, snapshot.stats.crawled, snapshot.stats.failed
    );

    if let Some(error) = &snapshot.error {
        println!("Error:      {}", error);
    }

    if !snapshot.navigation.is_empty() {
        println!("\nNavigation ({} entries):", snapshot.navigation.len());
        for link in &snapshot.navigation {
            println!("  {} -> {}", link.title, link.url);
        }
    }

    if snapshot.status == TaskStatus::Failed {
        anyhow::bail!("crawl failed");
    }

    Ok(())
}
