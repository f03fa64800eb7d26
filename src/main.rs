//! Article-Harvester main entry point
//!
//! This is the command-line interface for the crawler and the ingest worker.

use article_harvester::config::{load_config_with_hash, Config};
use article_harvester::crawler::run_crawl;
use article_harvester::ingest::run_ingest;
use article_harvester::output::{
    load_statistics, print_crawl_summary, print_ingest_summary, print_statistics,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Article-Harvester: a bounded news-channel crawler
///
/// In its default mode Article-Harvester crawls an allow-listed region of a
/// site breadth-first, publishes every extracted article to a durable queue,
/// and then downloads the referenced images. With `--ingest` it runs the
/// worker that persists queued articles.
#[derive(Parser, Debug)]
#[command(name = "article-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A bounded news-channel crawler with a durable ingest pipeline", long_about = None)]
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

    /// Run the ingest worker instead of the crawler
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    ingest: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["ingest", "stats"])]
    dry_run: bool,

    /// Show queue and store statistics and exit
    #[arg(long, conflicts_with_all = ["ingest", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.ingest {
        handle_ingest(&config).await?;
    } else {
        handle_crawl(&config).await?;
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
            0 => EnvFilter::new("article_harvester=info,warn"),
            1 => EnvFilter::new("article_harvester=debug,info"),
            2 => EnvFilter::new("article_harvester=trace,debug"),
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

/// Installs a Ctrl-C handler that sets the returned flag
fn interrupt_flag() -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, finishing current work");
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });
    interrupted
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Article-Harvester Dry Run ===\n");

    println!("Crawler:");
    println!("  Entry URL: {}", config.crawler.entry_url);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!(
        "  Allowed domains ({}):",
        config.crawler.allowed_domains.len()
    );
    for domain in &config.crawler.allowed_domains {
        println!("    - {}", domain);
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);

    println!("\nQueue:");
    println!("  Name: {}", config.queue.name);
    println!("  Database: {}", config.queue.database_path);

    println!("\nIngest:");
    println!("  Sink: {:?}", config.ingest.sink);
    println!("  Ack mode: {:?}", config.ingest.ack_mode);
    println!("  Threshold: {}", config.ingest.threshold);
    println!("  Output directory: {}", config.ingest.output_dir);
    if let Some(store) = &config.document_store {
        println!(
            "  Document store: {} (collection '{}')",
            store.database_path, store.collection
        );
    }

    println!("\nAssets:");
    println!("  Image directory: {}", config.assets.image_dir);
    println!("  Max workers: {}", config.assets.max_workers);

    println!("\nExtraction:");
    println!("  Title: {}", config.extract.title_selector);
    println!("  Date/source: {}", config.extract.byline_selector);
    println!("  Content: {}", config.extract.content_selector);
    println!("  Images: {}", config.extract.image_selector);
    println!("  Image prefix: {}", config.extract.image_prefix);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows queue depth and persisted counts
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Queue database: {}\n", config.queue.database_path);

    let stats = load_statistics(config)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --ingest mode: runs the worker until Ctrl-C
async fn handle_ingest(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let interrupted = interrupt_flag();

    match run_ingest(config, interrupted).await {
        Ok(stats) => {
            print_ingest_summary(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Ingest worker failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Entry URL: {}, allowed domains: {}",
        config.crawler.entry_url,
        config.crawler.allowed_domains.join(", ")
    );

    let interrupted = interrupt_flag();

    match run_crawl(config, interrupted).await {
        Ok(report) => {
            if report.crawl.interrupted {
                tracing::info!("Crawl interrupted; partial results reported");
            } else {
                tracing::info!("Crawl completed successfully");
            }
            print_crawl_summary(&report.crawl, &report.downloads);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
