//! UHRP Overlay CLI Application
//!
//! A command-line interface for running the UHRP topic manager and lookup
//! service against a local record index.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uhrp_overlay::cli::{self, AppState};

#[derive(Parser)]
#[command(name = "uhrp")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Universal Hash Resolution Protocol overlay", long_about = None)]
struct Cli {
    /// Data directory for the advertisement index
    #[arg(short, long, default_value = ".uhrp_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a transaction (raw or BEEF, hex encoded)
    Submit {
        /// Hex encoded transaction bundle
        bundle_hex: String,
    },

    /// Mark an advertisement as spent
    Spend {
        /// Outpoint as <txid>.<outputIndex>
        outpoint: String,
    },

    /// Evict an advertisement from the index
    Evict {
        /// Outpoint as <txid>.<outputIndex>
        outpoint: String,
    },

    /// Run a lookup query
    Lookup {
        /// JSON query, e.g. '{"uhrpUrl": "XUT..."}'
        query: String,
    },

    /// Show the advertisement at an outpoint
    Show {
        /// Outpoint as <txid>.<outputIndex>
        outpoint: String,
    },

    /// Build a signed advertisement locking script
    Advertise {
        /// Host private key (hex)
        #[arg(short, long)]
        key: String,

        /// SHA-256 of the content (hex)
        #[arg(long)]
        hash: String,

        /// HTTPS location of the hosted file
        #[arg(short, long)]
        url: String,

        /// Expiry time (seconds since epoch)
        #[arg(short, long)]
        expiry: u64,

        /// File size in bytes
        #[arg(short, long)]
        size: u64,
    },

    /// Print service documentation and metadata
    Docs,

    /// Show index statistics
    Stats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Advertise only signs, it needs no index
    if let Commands::Advertise {
        key,
        hash,
        url,
        expiry,
        size,
    } = &cli.command
    {
        return cli::cmd_advertise(key, hash, url, *expiry, *size);
    }

    let state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Advertise { .. } => unreachable!(),

        Commands::Submit { bundle_hex } => {
            cli::cmd_submit(&state, &bundle_hex)?;
        }

        Commands::Spend { outpoint } => {
            cli::cmd_spend(&state, &outpoint)?;
        }

        Commands::Evict { outpoint } => {
            cli::cmd_evict(&state, &outpoint)?;
        }

        Commands::Lookup { query } => {
            cli::cmd_lookup(&state, &query)?;
        }

        Commands::Show { outpoint } => {
            cli::cmd_show(&state, &outpoint)?;
        }

        Commands::Docs => {
            cli::cmd_docs(&state)?;
        }

        Commands::Stats => {
            cli::cmd_stats(&state)?;
        }
    }

    Ok(())
}
