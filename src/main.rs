// src/main.rs

//! campus-alerts CLI
//!
//! `run` starts the long-lived scheduler; `scrape` and `digest` run a
//! single pass for operational use.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

use campus_alerts::error::Result;
use campus_alerts::models::{Config, Source};
use campus_alerts::notify::Router;
use campus_alerts::pipeline;
use campus_alerts::scheduler;
use campus_alerts::scrape;
use campus_alerts::store::Database;
use campus_alerts::utils::http;

/// Campus noticeboard watcher and alert fanout
#[derive(Parser, Debug)]
#[command(name = "campus-alerts", version, about = "Campus noticeboard watcher and alert fanout")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scheduler: periodic scrapes plus the daily digest
    Run,

    /// Run one extraction cycle and exit
    Scrape {
        /// Restrict to a single source tag (PTU or GNDEC)
        #[arg(long)]
        source: Option<String>,
    },

    /// Run one daily digest pass and exit
    Digest,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    if let Command::Validate = cli.command {
        log::info!("Configuration OK ({})", cli.config.display());
        return Ok(());
    }

    let db = Database::open(&config.database_path)?;
    let client = http::create_client(&config.http)?;
    let router = Router::from_env(&config.channels, client.clone());
    let offset = scheduler::fixed_offset(&config.schedule)?;
    let sources = scrape::all_sources(&config, offset);

    match cli.command {
        Command::Run => {
            scheduler::run(&db, &router, &sources, &client, &config.schedule).await?;
        }

        Command::Scrape { source } => match source {
            Some(tag) => {
                let wanted = Source::from_str(&tag)?;
                for s in &sources {
                    if s.tag() == wanted {
                        pipeline::run_source(&db, &router, s.as_ref(), &client).await?;
                    }
                }
            }
            None => pipeline::run_all_sources(&db, &router, &sources, &client).await,
        },

        Command::Digest => {
            let today = chrono::Utc::now().with_timezone(&offset).date_naive();
            pipeline::run_daily_digest(&db, &router, today).await?;
        }

        Command::Validate => unreachable!("handled above"),
    }

    log::info!("Done!");
    Ok(())
}
