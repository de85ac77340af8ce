//! kgsim CLI
//!
//! Command-line front end for the knowledge-graph similarity explorer.
//!
//! # Commands
//!
//! - `search`: query the entity index by free text and print the ranked
//!   candidates
//! - `compare`: score a subject entity against candidate entities across
//!   the configured embedding types, print the ranked table, and
//!   optionally write the comparison as CSV

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// kgsim - Knowledge Graph Semantic Similarity explorer
#[derive(Parser)]
#[command(name = "kgsim-cli")]
#[command(version = "0.1.0")]
#[command(about = "Search a knowledge-graph entity index and compare entities by semantic similarity")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the entity index by free text
    Search(commands::search::SearchArgs),
    /// Compare a subject entity against candidates
    Compare(commands::compare::CompareArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch to command handlers
    let exit_code = match cli.command {
        Commands::Search(args) => commands::search::handle_search(args).await,
        Commands::Compare(args) => commands::compare::handle_compare(args).await,
    };

    std::process::exit(exit_code);
}
