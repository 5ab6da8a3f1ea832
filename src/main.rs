//! Gem Sniper - quality scoring and position risk management for new AMM pairs
//!
//! # WARNING
//! - Positions are opened through the paper trader only. Nothing is signed.
//! - Stop-loss and take-profit are evaluated on a polling interval. Prices can
//!   gap through a threshold between two ticks.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use gem_sniper::cli::commands;
use gem_sniper::config::Config;

/// Gem Sniper - score new pairs and manage positions
#[derive(Parser)]
#[command(name = "gem-sniper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a newly created pair
    Analyze {
        /// New token mint address
        #[arg(long)]
        token: String,

        /// Pool / pair address
        #[arg(long)]
        pool: String,

        /// Pooled base-asset amount
        #[arg(long)]
        base_amount: f64,

        /// Pooled token amount
        #[arg(long)]
        token_amount: f64,

        /// Open a paper position if the report says to trade
        #[arg(long)]
        open: bool,
    },

    /// Monitor open positions and apply exit rules
    Monitor {
        /// Run a single tick and exit
        #[arg(long)]
        once: bool,
    },

    /// Manually close a position
    Close {
        /// Token mint address
        token: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show saved positions and statistics
    Status,

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gem_sniper=info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze {
            token,
            pool,
            base_amount,
            token_amount,
            open,
        } => commands::analyze(&config, &token, &pool, base_amount, token_amount, open).await,
        Commands::Monitor { once } => commands::monitor(&config, once).await,
        Commands::Close { token, force } => commands::close(&config, &token, force).await,
        Commands::Status => commands::status(&config).await,
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
