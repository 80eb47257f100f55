//! taskboard CLI - run and maintain the taskboard server
//!
//! Subcommands:
//! - `serve`: apply migrations, then run the HTTP API
//! - `migrate`: apply pending migrations and exit
//! - `audit`: check that list and card positions are dense, optionally repairing them

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "taskboard",
    author,
    version,
    about = "Multi-board task tracker with dense, concurrency-safe ordering",
    long_about = "Serve the taskboard HTTP API and maintain its Postgres database. \
                  Lists and cards are kept at positions 1..N under concurrent moves."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply pending database migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Report parents whose children are not at positions 1..N
    Audit(commands::audit::AuditArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::Audit(args) => commands::run_audit(args).await?,
    }
    Ok(())
}
