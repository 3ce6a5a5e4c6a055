//! docrepo CLI
//!
//! Command-line tools that exercise the repository layer against the
//! in-memory backend.
//!
//! # Commands
//!
//! - `seed` - Bulk-create random entities and report throughput
//! - `roundtrip` - Run every repository operation once and time it
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use docrepo_core::RepositoryConfig;
use docrepo_testkit::{SampleEntity, TEST_DATABASE};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// docrepo command-line tools.
#[derive(Parser)]
#[command(name = "docrepo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database name
    #[arg(global = true, short, long, default_value = TEST_DATABASE)]
    database: String,

    /// Per-call deadline in milliseconds (0 disables it)
    #[arg(global = true, long, default_value = "30000")]
    timeout_ms: u64,

    /// Artificial backend latency per call in milliseconds
    #[arg(global = true, long, default_value = "0")]
    latency_ms: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-create random entities and report throughput
    Seed {
        /// Number of entities to create
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Maximum concurrent writes
        #[arg(short = 'j', long, default_value = "64")]
        concurrency: usize,

        /// Also time a drain of the container with this page size
        #[arg(short, long)]
        page_size: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run create, read, query, update and delete once each
    Roundtrip,

    /// Show version information
    Version,
}

impl Cli {
    fn config(&self) -> RepositoryConfig {
        let timeout = (self.timeout_ms > 0).then_some(Duration::from_millis(self.timeout_ms));
        RepositoryConfig::for_entity::<SampleEntity>(self.database.clone()).operation_timeout(timeout)
    }

    fn latency(&self) -> Option<Duration> {
        (self.latency_ms > 0).then_some(Duration::from_millis(self.latency_ms))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.config();
    let latency = cli.latency();

    match cli.command {
        Commands::Seed {
            count,
            concurrency,
            page_size,
            format,
        } => {
            let config = config.max_concurrency(concurrency);
            commands::seed::run(config, latency, count, page_size, &format).await?;
        }
        Commands::Roundtrip => {
            commands::roundtrip::run(config, latency).await?;
        }
        Commands::Version => {
            println!("docrepo CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
