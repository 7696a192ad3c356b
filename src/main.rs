//! dota-price-checker - Batch Steam Community Market price checker
//!
//! Reads item names (one per line) from a file or stdin and writes a price report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dota_price_checker::commands::{ScrapeCommand, SummarizeCommand};
use dota_price_checker::config::{Config, OutputFormat};
use dota_price_checker::session::{ScrapeSession, SessionRegistry};
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dota-price-checker",
    version,
    about = "Batch Steam Community Market price checker for Dota 2 items",
    long_about = "Looks up Steam Community Market prices (PHP) for a list of Dota 2 items, one request at a time, and writes a tab-separated report."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "DPC_PROXY")]
    proxy: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Per-item lines to include in the summary
    #[arg(long, global = true)]
    sample: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape prices for a list of items
    #[command(alias = "s")]
    Scrape {
        /// File with one item name per line (stdin if omitted)
        input: Option<PathBuf>,

        /// Directory for the report file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Attempts per item
        #[arg(long)]
        max_retries: Option<u32>,

        /// Items between progress checkpoints
        #[arg(long)]
        checkpoint_every: Option<usize>,

        /// Skip all pacing delays (risks rate limiting)
        #[arg(long)]
        no_delay: bool,

        /// Session name used to reject overlapping runs
        #[arg(long, default_value = "cli")]
        session: String,
    },

    /// Recount the summary of an existing report
    Summarize {
        /// Report file written by `scrape`
        report: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(sample) = cli.sample {
        config.sample_lines = sample;
    }

    match cli.command {
        Commands::Scrape { input, output_dir, max_retries, checkpoint_every, no_delay, session } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(retries) = max_retries {
                config.max_retries = retries;
            }
            if let Some(every) = checkpoint_every {
                config.checkpoint_every = every;
            }
            if no_delay {
                config = config.without_delays();
            }

            let text = read_input(input.as_deref())?;
            let session = match ScrapeSession::from_message(session, &text) {
                Ok(session) => session,
                Err(e) if e.is_validation() => {
                    eprintln!("{}", e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after the current item");
                    on_signal.cancel();
                }
            });

            let cmd = ScrapeCommand::new(config, SessionRegistry::new());
            let output = cmd.execute(session, cancel).await?;
            println!("{}", output);
        }

        Commands::Summarize { report } => {
            let cmd = SummarizeCommand::new(config.format, config.sample_lines);
            let output = cmd.execute(&report)?;
            println!("{}", output);
        }
    }

    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read item list: {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("Failed to read item list from stdin")?;
            Ok(text)
        }
    }
}
