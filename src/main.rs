mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jotter::config::JotterConfig;

#[derive(Parser)]
#[command(name = "jotter", version, about = "Note store maintenance and RSS feeds")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the public RSS feed to stdout
    Feed {
        /// Only notes by this user id
        #[arg(long)]
        creator: Option<i64>,
        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Remove orphaned rows and compact the database file
    Vacuum {
        /// Print the per-step report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run database diagnostics
    Doctor {
        /// Print the health report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = JotterConfig::load()?;

    // Log to stderr so stdout stays clean for feed output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Feed { creator, base_url } => {
            cli::feed::feed(&config, creator, base_url.as_deref())?;
        }
        Command::Vacuum { json } => {
            cli::vacuum::vacuum(&config, json).await?;
        }
        Command::Doctor { json } => {
            cli::doctor::doctor(&config, json)?;
        }
    }

    Ok(())
}
