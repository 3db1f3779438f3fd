//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;
use std::path::{Path, PathBuf};

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "providers.timeout_secs")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,

    /// Check fields against the record model
    #[arg(long)]
    pub check: bool,
}

/// Run the config command
///
/// `file` overrides the default config location.
pub fn run(args: ConfigArgs, file: Option<&Path>) -> Result<()> {
    let path: PathBuf = match file {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    if args.path {
        println!("{}", path.display());
        return Ok(());
    }

    if args.reset {
        Config::default().save_to(&path)?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = match file {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if args.check {
        config.validate()?;
        println!("{} field(s) OK", config.fields.len());
        return Ok(());
    }

    match (&args.key, &args.value) {
        // No arguments: show all config
        (None, None) => {
            let content = toml::to_string_pretty(&config)
                .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
            print!("{}", content);
        }

        // Key only: show that value
        (Some(key), None) => match config.get(key) {
            Some(value) => println!("{}", value),
            None if Config::available_keys().contains(&key.as_str()) => println!(),
            None => {
                let available = Config::available_keys()
                    .iter()
                    .map(|k| format!("  {}", k))
                    .collect::<Vec<_>>()
                    .join("\n");
                return Err(Error::Config(format!(
                    "Unknown config key: {}\n\nAvailable keys:\n{}",
                    key, available
                )));
            }
        },

        // Key and value: set the value
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save_to(&path)?;
            println!("{} = {}", key, value);
        }

        (None, Some(_)) => {
            return Err(Error::Config("Must specify a key to set a value".to_string()));
        }
    }

    Ok(())
}
