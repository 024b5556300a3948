//! Pinup CLI - Resilient image uploads to object storage.
//!
//! Pinup shrinks and re-encodes images, then uploads them one at a time with
//! bounded retries, printing the public URL of each image in input order.
//!
//! # Usage
//!
//! ```bash
//! # Upload photos for a listing
//! pinup upload a.jpg b.png --site listing --owner user-42
//!
//! # Try the pipeline without touching remote storage
//! pinup upload a.jpg --site moment --owner user-42 --dry-run
//!
//! # Print an image's data URL
//! pinup encode a.jpg
//!
//! # View configuration
//! pinup config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Pinup - Resilient image uploads to object storage.
#[derive(Parser, Debug)]
#[command(name = "pinup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compress and upload images, printing their public URLs
    Upload(cli::upload::UploadArgs),

    /// Compress one image and print its data URL
    Encode(cli::encode::EncodeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match pinup_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `pinup config path`."
            );
            pinup_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Pinup v{}", pinup_core::VERSION);

    match cli.command {
        Commands::Upload(args) => cli::upload::execute(args, config).await,
        Commands::Encode(args) => cli::encode::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
