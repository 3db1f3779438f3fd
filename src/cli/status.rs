//! Status command handler
//!
//! Checks whether a server is running and reports its state.

use crate::config::Config;
use crate::error::Result;
use crate::server::routes::StatusResponse;
use clap::Args;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Server address (host:port), defaults to the configured one
    #[arg(long)]
    pub addr: Option<String>,
}

/// Run the status command
pub async fn run(args: StatusArgs, config: Config) -> Result<()> {
    let addr = args.addr.unwrap_or_else(|| config.server_addr());
    let url = format!("http://{}/api/status", addr);

    println!("geo-distance v{}", env!("CARGO_PKG_VERSION"));
    println!();

    match reqwest::get(&url).await {
        Ok(response) if response.status().is_success() => {
            println!("Server: RUNNING on {}", addr);
            if let Ok(status) = response.json::<StatusResponse>().await {
                println!("  Version: {}", status.version);
                println!("  Uptime: {}s", status.uptime_secs);
                println!("  Fields: {}", status.fields.join(", "));
                println!("  Providers: {}", status.providers.join(", "));
                println!("  Degraded runs: {}", status.degraded_runs);
            }
        }
        Ok(response) => {
            println!("Server: ERROR (status {})", response.status());
        }
        Err(_) => {
            println!("Server: NOT RUNNING on {}", addr);
        }
    }

    Ok(())
}
