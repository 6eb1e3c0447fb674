use anyhow::Result;
use authcache::commands::{clear, resolve_store, status};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "authcache")]
#[command(about = "Inspect the cached browser session used by UI test fixtures", long_about = None)]
#[command(version)]
struct Cli {
    /// Fixture config file
    #[arg(short, long, global = true, default_value = "authcache.toml")]
    config: PathBuf,

    /// Snapshot file to operate on (overrides the config)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the cached session would be reused
    Status,

    /// Delete the cached session so the next run signs in again
    Clear,
}

fn main() -> Result<()> {
    authcache::logging::init();

    let cli = Cli::parse();
    let store = resolve_store(&cli.config, cli.path.as_deref())?;

    match cli.command {
        Commands::Status => status::execute(&store),
        Commands::Clear => clear::execute(&store),
    }
}
