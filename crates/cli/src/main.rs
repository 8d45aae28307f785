//! agromie CLI: the composition root.
//!
//! Commands:
//! - `onboard`: Write the default config file
//! - `agent`: Send farm commands to the assistant (one-shot or interactive)
//! - `op`: Run a single domain operation directly, bypassing the model
//! - `balance`: Show stocking balance and financial metrics
//! - `tools`: List the tool catalog offered to the model

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "agromie",
    about = "agromie: farm records from natural-language commands",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Talk to the farm assistant
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Override the iteration cap for each message
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Run one domain operation with a JSON argument bag
    Op {
        /// Operation name, e.g. registrar_despesa
        name: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Show stocking balance and financial metrics
    Balance {
        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// List the tools offered to the model
    Tools,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Agent {
            message,
            max_iterations,
        } => commands::agent::run(message, max_iterations).await?,
        Commands::Op { name, args } => commands::op::run(&name, &args).await?,
        Commands::Balance { start, end } => {
            commands::balance::run(start.as_deref(), end.as_deref()).await?
        }
        Commands::Tools => commands::tools::run().await?,
    }

    Ok(())
}
