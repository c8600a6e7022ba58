//! LeadChat CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write a starter config
//! - `serve`: Start the widget HTTP endpoints
//! - `chat`: Talk to the persona from the terminal
//! - `stats`: Print dashboard statistics as JSON
//! - `doctor`: Diagnose configuration and storage

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "leadchat",
    about = "LeadChat — chat widget backend with lead capture",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Start the HTTP server for the widget
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the configured persona
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print lead statistics
    Stats,

    /// Diagnose configuration, API key and lead storage
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Stats => commands::stats::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
