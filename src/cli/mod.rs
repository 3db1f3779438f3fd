//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod providers;
pub mod rank;
pub mod resolve;
pub mod serve;
pub mod status;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::get_formatter;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Rank records by distance to a geocoded address
#[derive(Parser)]
#[command(name = "geo-distance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an address to coordinates (through the cache)
    Resolve(resolve::ResolveArgs),

    /// Rank record ids by distance
    Rank(rank::RankArgs),

    /// List lookup providers and configured fields
    Providers(providers::ProvidersArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Check whether a server is running
    Status(status::StatusArgs),
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Resolve(args) => resolve::run(args, load_config(config_path)?).await,
        Commands::Rank(args) => rank::run(args, load_config(config_path)?).await,
        Commands::Providers(args) => providers::run(args, load_config(config_path)?),
        Commands::Serve(args) => serve::run(args, load_config(config_path)?).await,
        Commands::Config(args) => config::run(args, config_path),
        Commands::Status(args) => status::run(args, load_config(config_path)?).await,
    }
}

/// Log to stderr; stdout is reserved for command output
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config from an explicit path or the default location
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Format and print a report with the named formatter
fn print_with<F>(format: &str, render: F) -> Result<()>
where
    F: FnOnce(&dyn crate::format::OutputFormatter) -> Result<String>,
{
    let formatter = get_formatter(format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", format)))?;
    let output = render(formatter.as_ref())?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Parse a `name=value` argument
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
