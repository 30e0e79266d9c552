//! tgscout main entry point
//!
//! This is the command-line interface for the tgscout ratings scraper.

use anyhow::Context;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tgscout::config::{env_layer, resolve_config, ConfigLayer, ContentType};
use tgscout::crawler::run_scrape;
use tgscout::output::print_report;
use tgscout::url::CATEGORIES;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Name of the log file inside the log directory
const LOG_FILE_NAME: &str = "app.log";

/// tgscout: a polite scraper for Telegram catalogue ratings
///
/// tgscout walks the paginated channel or chat ratings of a catalogue,
/// pacing its requests and backing off when rate limited, and writes
/// title, subscriber count and t.me link of every entry to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "tgscout")]
#[command(version = "1.0.0")]
#[command(about = "A polite Telegram ratings scraper", long_about = None)]
struct Cli {
    /// Listing URL to scrape
    #[arg(long, conflicts_with = "category")]
    url: Option<String>,

    /// Category code (see --list-categories)
    #[arg(short, long)]
    category: Option<String>,

    /// Content type: channels or chats
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    content_type: Option<ContentType>,

    /// Number of listing pages to fetch
    #[arg(short, long)]
    pages: Option<u32>,

    /// Output directory for <type>.csv
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Base delay before every request, in seconds
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Upper bound of the random jitter added to every delay, in seconds
    #[arg(long, value_name = "SECONDS")]
    jitter: Option<f64>,

    /// Proxy URL (http, https, socks5)
    #[arg(long)]
    proxy: Option<String>,

    /// Fetch a single page to verify configuration and connectivity
    #[arg(long)]
    self_check: bool,

    /// Request timeout, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// Attempts per page, first try included
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Cap on the retry backoff, in seconds
    #[arg(long, value_name = "SECONDS")]
    max_backoff: Option<f64>,

    /// Catalogue site that category codes are resolved against
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Keep records whose link was already seen in this run
    #[arg(long)]
    keep_duplicates: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the supported category codes and exit
    #[arg(long)]
    list_categories: bool,

    /// Directory for the log file
    #[arg(long, value_name = "DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Do not write a log file
    #[arg(long)]
    no_log_file: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Settings given on the command line, as the top configuration layer
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            url: self.url.clone(),
            category: self.category.clone(),
            content_type: self.content_type,
            pages: self.pages,
            outdir: self.outdir.clone(),
            base_url: self.base_url.clone(),
            delay: self.delay,
            jitter: self.jitter,
            max_backoff: self.max_backoff,
            max_attempts: self.max_attempts,
            timeout: self.timeout,
            proxy: self.proxy.clone(),
            self_check: self.self_check.then_some(true),
            dedupe: self.keep_duplicates.then_some(false),
            ..ConfigLayer::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if cli.list_categories {
        print_categories();
        return Ok(());
    }

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    setup_logging(cli.verbose, cli.quiet, log_dir)?;

    let env = env_layer(|name| std::env::var(name).ok())?;
    let config = match resolve_config(cli.layer(), env, cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let report = match run_scrape(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            return Err(e).context("scrape failed");
        }
    };

    if !cli.quiet {
        print_report(&report);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Events go to stderr and, unless disabled, are appended to
/// `<log_dir>/app.log` without ANSI colours. `RUST_LOG` overrides the
/// verbosity flags.
fn setup_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let default_filter = if quiet {
        // Only show errors
        "error"
    } else {
        match verbose {
            0 => "tgscout=info,warn",
            1 => "tgscout=debug,info",
            2 => "tgscout=trace,debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let path = dir.join(LOG_FILE_NAME);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

/// Prints the category table for --list-categories
fn print_categories() {
    println!("=== Categories ===\n");
    for category in CATEGORIES {
        println!("  {:<14} {}", category.code, category.label);
    }
}
